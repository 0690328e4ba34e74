//! SSE 2-lane `Complex<f32>` SIMD packet implementation.
//!
//! This module provides [`C32x2`], a packet holding two single-precision
//! complex numbers in one `__m128` register as interleaved (real, imag)
//! pairs: `[re0, im0, re1, im1]`.
//!
//! There is no native complex multiply instruction, so multiplication,
//! division, and the conditionally-conjugated variants are built from lane
//! shuffles and sign-mask XORs. The three shuffle patterns used throughout
//! are:
//!
//! - `0xA0` duplicates the real sub-lanes: `[re0, re0, re1, re1]`
//! - `0xF5` duplicates the imaginary sub-lanes: `[im0, im0, im1, im1]`
//! - `0xB1` swaps real and imaginary within each pair:
//!   `[im0, re0, im1, re1]`
//!
//! and the sign masks flip either the real or the imaginary sub-lanes of a
//! product term. Each conjugation variant is its own exact identity; none
//! is derived by conjugating an operand first, which would spend an extra
//! mask per call.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Div, Mul, Neg, Sub};

use num::complex::Complex;

use crate::simd::sse::SSE_ALIGNMENT;
use crate::simd::{Alignment, Packet};

/// Number of `Complex<f32>` lanes in a 128-bit register.
pub(crate) const LANE_COUNT: usize = 2;

/// Duplicates the real sub-lane of each complex pair.
const DUP_RE: i32 = 0xA0;

/// Duplicates the imaginary sub-lane of each complex pair.
const DUP_IM: i32 = 0xF5;

/// Swaps real and imaginary within each complex pair.
const SWAP_RI: i32 = 0xB1;

/// SSE SIMD packet containing 2 packed `Complex<f32>` values.
#[derive(Copy, Clone, Debug)]
pub struct C32x2 {
    /// 128-bit register holding `[re0, im0, re1, im1]`
    pub(crate) v: __m128,
}

/// Sign mask over the real sub-lanes: `[-0.0, 0.0, -0.0, 0.0]`.
#[inline(always)]
unsafe fn mask_real() -> __m128 {
    _mm_setr_ps(-0.0, 0.0, -0.0, 0.0)
}

/// Sign mask over the imaginary sub-lanes: `[0.0, -0.0, 0.0, -0.0]`.
#[inline(always)]
unsafe fn mask_imag() -> __m128 {
    _mm_setr_ps(0.0, -0.0, 0.0, -0.0)
}

impl Alignment<Complex<f32>> for C32x2 {
    #[inline(always)]
    fn is_aligned(ptr: *const Complex<f32>) -> bool {
        ptr as usize % SSE_ALIGNMENT == 0
    }
}

impl Packet for C32x2 {
    type Scalar = Complex<f32>;

    const LANES: usize = LANE_COUNT;
    const ALIGNMENT: usize = SSE_ALIGNMENT;

    #[inline(always)]
    fn splat(value: Complex<f32>) -> Self {
        Self {
            v: unsafe { _mm_setr_ps(value.re, value.im, value.re, value.im) },
        }
    }

    #[inline(always)]
    fn first(self) -> Complex<f32> {
        let mut out = [0.0f32; 4];
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), self.v) };
        Complex::new(out[0], out[1])
    }

    /// # Safety
    ///
    /// `ptr` must be 16-byte aligned and point to at least 2 valid
    /// `Complex<f32>` values.
    #[inline(always)]
    unsafe fn load_aligned(ptr: *const Complex<f32>) -> Self {
        Self {
            v: _mm_load_ps(ptr as *const f32),
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to at least 2 valid `Complex<f32>` values.
    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const Complex<f32>) -> Self {
        Self {
            v: _mm_loadu_ps(ptr as *const f32),
        }
    }

    /// # Safety
    ///
    /// `ptr` must be 16-byte aligned and point to at least 2 writable
    /// `Complex<f32>` slots.
    #[inline(always)]
    unsafe fn store_aligned(self, ptr: *mut Complex<f32>) {
        _mm_store_ps(ptr as *mut f32, self.v)
    }

    /// # Safety
    ///
    /// `ptr` must point to at least 2 writable `Complex<f32>` slots.
    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut Complex<f32>) {
        _mm_storeu_ps(ptr as *mut f32, self.v)
    }

    /// Negates the imaginary sub-lanes via one sign-mask XOR.
    #[inline(always)]
    fn conjugate(self) -> Self {
        Self {
            v: unsafe { _mm_xor_ps(self.v, mask_imag()) },
        }
    }

    #[inline(always)]
    fn conj_mul<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self) -> Self {
        unsafe {
            // Both products share the same two terms; the conjugation
            // variant decides which term carries the sign mask and whether
            // the terms are added or subtracted.
            let re_dup = _mm_shuffle_ps(a.v, a.v, DUP_RE);
            let im_dup = _mm_shuffle_ps(a.v, a.v, DUP_IM);
            let b_swap = _mm_shuffle_ps(b.v, b.v, SWAP_RI);

            let t0 = _mm_mul_ps(re_dup, b.v);
            let t1 = _mm_mul_ps(im_dup, b_swap);

            let v = match (CONJ_A, CONJ_B) {
                (false, false) => _mm_add_ps(t0, _mm_xor_ps(t1, mask_real())),
                (true, false) => _mm_add_ps(t0, _mm_xor_ps(t1, mask_imag())),
                (false, true) => _mm_add_ps(_mm_xor_ps(t0, mask_imag()), t1),
                (true, true) => _mm_sub_ps(_mm_xor_ps(t0, mask_imag()), t1),
            };
            Self { v }
        }
    }

    /// Sums the two complex lanes by adding the high pair onto the low
    /// pair, keeping real and imaginary sub-lanes separate.
    #[inline(always)]
    fn reduce_add(self) -> Complex<f32> {
        Self {
            v: unsafe { _mm_add_ps(self.v, _mm_movehl_ps(self.v, self.v)) },
        }
        .first()
    }

    /// Horizontal add of both operands: `[a0+a1, b0+b1]` as complex lanes.
    #[inline(always)]
    fn reduce_add_pairs(a: Self, b: Self) -> Self {
        Self {
            v: unsafe { _mm_add_ps(_mm_movelh_ps(a.v, b.v), _mm_movehl_ps(b.v, a.v)) },
        }
    }

    /// Reverses the complex lane order; each (real, imag) pair stays
    /// intact.
    #[inline(always)]
    fn reverse(self) -> Self {
        Self {
            v: unsafe { _mm_shuffle_ps(self.v, self.v, 0x4E) },
        }
    }

    #[inline(always)]
    fn align_with<const OFFSET: usize>(prev: Self, next: Self) -> Self {
        match OFFSET {
            0 => prev,
            // [prev.lane1, next.lane0]
            1 => Self {
                v: unsafe { _mm_shuffle_ps(prev.v, next.v, 0x4E) },
            },
            _ => unreachable!("offset must be less than the lane count"),
        }
    }
}

impl Add for C32x2 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self {
            v: unsafe { _mm_add_ps(self.v, rhs.v) },
        }
    }
}

impl Sub for C32x2 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self {
            v: unsafe { _mm_sub_ps(self.v, rhs.v) },
        }
    }
}

impl Mul for C32x2 {
    type Output = Self;

    /// Full complex multiply per lane pair:
    /// `(ar*br - ai*bi) + i(ar*bi + ai*br)`.
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self::conj_mul::<false, false>(self, rhs)
    }
}

impl Div for C32x2 {
    type Output = Self;

    /// Complex division via `a * conj(b) / |b|^2` per lane pair.
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe {
            let num = Self::conj_mul::<false, true>(self, rhs);
            let sq = _mm_mul_ps(rhs.v, rhs.v);
            let norm = _mm_add_ps(sq, _mm_shuffle_ps(sq, sq, SWAP_RI));
            Self {
                v: _mm_div_ps(num.v, norm),
            }
        }
    }
}

impl Neg for C32x2 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            v: unsafe { _mm_xor_ps(self.v, _mm_set1_ps(-0.0)) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_array(p: C32x2) -> [Complex<f32>; 2] {
        let mut out = [Complex::new(0.0f32, 0.0); 2];
        unsafe { p.store_unaligned(out.as_mut_ptr()) };
        out
    }

    fn from_array(data: [Complex<f32>; 2]) -> C32x2 {
        unsafe { C32x2::load_unaligned(data.as_ptr()) }
    }

    fn approx_eq(a: Complex<f32>, b: Complex<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn splat_fills_both_lanes() {
        let c = Complex::new(1.0, -2.0);
        assert_eq!(to_array(C32x2::splat(c)), [c, c]);
    }

    #[test]
    fn mul_matches_scalar_complex_product() {
        let a = [Complex::new(1.0, 2.0), Complex::new(-3.0, 0.5)];
        let b = [Complex::new(0.5, -1.0), Complex::new(2.0, 2.0)];

        let got = to_array(from_array(a) * from_array(b));
        assert_eq!(got[0], a[0] * b[0]);
        assert_eq!(got[1], a[1] * b[1]);
    }

    #[test]
    fn div_matches_scalar_complex_quotient() {
        let a = [Complex::new(4.0, 2.0), Complex::new(-1.0, 3.0)];
        let b = [Complex::new(1.0, -1.0), Complex::new(2.0, 0.5)];

        let got = to_array(from_array(a) / from_array(b));
        assert!(approx_eq(got[0], a[0] / b[0]));
        assert!(approx_eq(got[1], a[1] / b[1]));
    }

    #[test]
    fn conjugate_negates_imaginary_sublanes() {
        let a = [Complex::new(1.0, 2.0), Complex::new(-3.0, -4.0)];
        let got = to_array(from_array(a).conjugate());
        assert_eq!(got, [a[0].conj(), a[1].conj()]);
    }

    #[test]
    fn conj_mul_variants_match_scalar_identities() {
        let a = [Complex::new(1.5, -0.5), Complex::new(2.0, 3.0)];
        let b = [Complex::new(-1.0, 2.5), Complex::new(0.25, -4.0)];
        let (pa, pb) = (from_array(a), from_array(b));

        let plain = to_array(C32x2::conj_mul::<false, false>(pa, pb));
        let conj_a = to_array(C32x2::conj_mul::<true, false>(pa, pb));
        let conj_b = to_array(C32x2::conj_mul::<false, true>(pa, pb));
        let conj_both = to_array(C32x2::conj_mul::<true, true>(pa, pb));

        for lane in 0..2 {
            assert!(approx_eq(plain[lane], a[lane] * b[lane]));
            assert!(approx_eq(conj_a[lane], a[lane].conj() * b[lane]));
            assert!(approx_eq(conj_b[lane], a[lane] * b[lane].conj()));
            assert!(approx_eq(conj_both[lane], a[lane].conj() * b[lane].conj()));
        }
    }

    #[test]
    fn reduce_add_keeps_sublanes_separate() {
        let a = [Complex::new(1.0, 10.0), Complex::new(2.0, 20.0)];
        assert_eq!(from_array(a).reduce_add(), Complex::new(3.0, 30.0));
    }

    #[test]
    fn reduce_add_pairs_packs_both_sums() {
        let a = [Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)];
        let b = [Complex::new(10.0, 20.0), Complex::new(30.0, 40.0)];
        let got = to_array(C32x2::reduce_add_pairs(from_array(a), from_array(b)));
        assert_eq!(got, [Complex::new(4.0, 6.0), Complex::new(40.0, 60.0)]);
    }

    #[test]
    fn reverse_and_align_keep_pairs_intact() {
        let a = [Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)];
        let b = [Complex::new(5.0, 6.0), Complex::new(7.0, 8.0)];
        let (pa, pb) = (from_array(a), from_array(b));

        assert_eq!(to_array(pa.reverse()), [a[1], a[0]]);
        assert_eq!(to_array(C32x2::align_with::<0>(pa, pb)), a);
        assert_eq!(to_array(C32x2::align_with::<1>(pa, pb)), [a[1], b[0]]);
    }
}
