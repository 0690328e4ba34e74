//! SSE 1-lane `Complex<f64>` SIMD packet implementation.
//!
//! One double-precision complex number fills a whole `__m128d` register as
//! a (real, imag) pair, so this packet has a single lane: loads, stores,
//! and the shuffle-based multiply still run on vector registers, but all
//! horizontal operations (reduction, reversal, lane alignment) degenerate
//! to identities.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Div, Mul, Neg, Sub};

use num::complex::Complex;

use crate::simd::sse::SSE_ALIGNMENT;
use crate::simd::{Alignment, Packet};

/// SSE SIMD packet containing 1 `Complex<f64>` value.
#[derive(Copy, Clone, Debug)]
pub struct C64x1 {
    /// 128-bit register holding `[re, im]`
    pub(crate) v: __m128d,
}

/// Sign mask over the real sub-lane: `[-0.0, 0.0]`.
#[inline(always)]
unsafe fn mask_real() -> __m128d {
    _mm_setr_pd(-0.0, 0.0)
}

/// Sign mask over the imaginary sub-lane: `[0.0, -0.0]`.
#[inline(always)]
unsafe fn mask_imag() -> __m128d {
    _mm_setr_pd(0.0, -0.0)
}

impl Alignment<Complex<f64>> for C64x1 {
    #[inline(always)]
    fn is_aligned(ptr: *const Complex<f64>) -> bool {
        ptr as usize % SSE_ALIGNMENT == 0
    }
}

impl Packet for C64x1 {
    type Scalar = Complex<f64>;

    const LANES: usize = 1;
    const ALIGNMENT: usize = SSE_ALIGNMENT;

    #[inline(always)]
    fn splat(value: Complex<f64>) -> Self {
        Self {
            v: unsafe { _mm_setr_pd(value.re, value.im) },
        }
    }

    #[inline(always)]
    fn first(self) -> Complex<f64> {
        let mut out = [0.0f64; 2];
        unsafe { _mm_storeu_pd(out.as_mut_ptr(), self.v) };
        Complex::new(out[0], out[1])
    }

    /// # Safety
    ///
    /// `ptr` must be 16-byte aligned and point to a valid `Complex<f64>`.
    #[inline(always)]
    unsafe fn load_aligned(ptr: *const Complex<f64>) -> Self {
        Self {
            v: _mm_load_pd(ptr as *const f64),
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to a valid `Complex<f64>`.
    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const Complex<f64>) -> Self {
        Self {
            v: _mm_loadu_pd(ptr as *const f64),
        }
    }

    /// # Safety
    ///
    /// `ptr` must be 16-byte aligned and point to a writable
    /// `Complex<f64>` slot.
    #[inline(always)]
    unsafe fn store_aligned(self, ptr: *mut Complex<f64>) {
        _mm_store_pd(ptr as *mut f64, self.v)
    }

    /// # Safety
    ///
    /// `ptr` must point to a writable `Complex<f64>` slot.
    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut Complex<f64>) {
        _mm_storeu_pd(ptr as *mut f64, self.v)
    }

    #[inline(always)]
    fn conjugate(self) -> Self {
        Self {
            v: unsafe { _mm_xor_pd(self.v, mask_imag()) },
        }
    }

    #[inline(always)]
    fn conj_mul<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self) -> Self {
        unsafe {
            let re_dup = _mm_unpacklo_pd(a.v, a.v);
            let im_dup = _mm_unpackhi_pd(a.v, a.v);
            let b_swap = _mm_shuffle_pd(b.v, b.v, 0x1);

            let t0 = _mm_mul_pd(re_dup, b.v);
            let t1 = _mm_mul_pd(im_dup, b_swap);

            let v = match (CONJ_A, CONJ_B) {
                (false, false) => _mm_add_pd(t0, _mm_xor_pd(t1, mask_real())),
                (true, false) => _mm_add_pd(t0, _mm_xor_pd(t1, mask_imag())),
                (false, true) => _mm_add_pd(_mm_xor_pd(t0, mask_imag()), t1),
                (true, true) => _mm_sub_pd(_mm_xor_pd(t0, mask_imag()), t1),
            };
            Self { v }
        }
    }

    #[inline(always)]
    fn reduce_add(self) -> Complex<f64> {
        self.first()
    }

    #[inline(always)]
    fn reduce_add_pairs(a: Self, _b: Self) -> Self {
        a
    }

    #[inline(always)]
    fn reverse(self) -> Self {
        self
    }

    #[inline(always)]
    fn align_with<const OFFSET: usize>(prev: Self, _next: Self) -> Self {
        debug_assert!(OFFSET == 0, "offset must be less than the lane count");
        prev
    }
}

impl Add for C64x1 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self {
            v: unsafe { _mm_add_pd(self.v, rhs.v) },
        }
    }
}

impl Sub for C64x1 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self {
            v: unsafe { _mm_sub_pd(self.v, rhs.v) },
        }
    }
}

impl Mul for C64x1 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self::conj_mul::<false, false>(self, rhs)
    }
}

impl Div for C64x1 {
    type Output = Self;

    /// Complex division via `a * conj(b) / |b|^2`.
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe {
            let num = Self::conj_mul::<false, true>(self, rhs);
            let sq = _mm_mul_pd(rhs.v, rhs.v);
            let norm = _mm_add_pd(sq, _mm_shuffle_pd(sq, sq, 0x1));
            Self {
                v: _mm_div_pd(num.v, norm),
            }
        }
    }
}

impl Neg for C64x1 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            v: unsafe { _mm_xor_pd(self.v, _mm_set1_pd(-0.0)) },
        }
    }
}
