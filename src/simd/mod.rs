//! SIMD packet abstraction layer.
//!
//! This module defines the portable vector-register contract every kernel in
//! this crate is written against. A *packet* is a fixed-width register value
//! holding [`Packet::LANES`] scalar lanes; it is created, combined, and
//! consumed inside a single kernel invocation and never stored long-term.
//!
//! One packet implementation exists per (instruction set, scalar type) pair,
//! selected at build time by `build.rs`:
//!
//! - `cfg(sse)`: 128-bit x86 packets, [`sse::f32x4::F32x4`],
//!   [`sse::f64x2::F64x2`], and the complex packets [`sse::c32x2::C32x2`]
//!   and [`sse::c64x1::C64x1`].
//! - `cfg(neon)`: the 128-bit AArch64 packet [`neon::f32x4::F32x4`]. Scalar
//!   types without a NEON packet take the width-1 fallback.
//! - `cfg(fallback)`: every scalar type uses [`scalar::ScalarPacket`],
//!   a width-1 implementation of the same contract, so all kernel code is
//!   correct (if slower) on any platform without vector support.
//!
//! # Contract
//!
//! This layer performs no runtime validation. Passing a misaligned pointer
//! to an aligned load/store, or lying about packet capability upstream, is a
//! caller contract violation and undefined behavior, not a recoverable
//! error. Callers must route scalar types without vector support through the
//! scalar strategy paths.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num::complex::Complex;
use num::traits::{One, Zero};

pub mod scalar;
pub mod utils;

#[cfg(sse)]
pub mod sse;

#[cfg(neon)]
pub mod neon;

/// Byte alignment guaranteed by this crate's aligned storage, large enough
/// for the widest register any selected packet implementation uses.
pub const PACKET_ALIGN: usize = 16;

/// Coefficient scalar contract: the arithmetic, conjugation, and cost
/// metadata the kernels need from an element type.
///
/// The cost constants feed the unrolling decision in
/// [`crate::strategy`]; they are a crude cycle proxy (reads + adds), chosen
/// for compile-time decidability rather than numerical accuracy.
pub trait Scalar:
    Copy
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Zero
    + One
{
    /// Cost estimate of one addition of this type.
    const ADD_COST: usize;

    /// Cost estimate of one multiplication of this type.
    const MUL_COST: usize;

    /// Cost estimate of reading one coefficient of this type from memory.
    const READ_COST: usize;

    /// Complex conjugate; identity for real types.
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }

    /// Conditionally-conjugate multiply: `conj?(a) * conj?(b)`.
    ///
    /// Each of the four sign configurations is a direct arithmetic identity
    /// for complex types, not `conj` followed by `mul`. Real types ignore
    /// the flags.
    #[inline(always)]
    fn conj_mul<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self) -> Self {
        a * b
    }

    /// Conditionally-conjugate multiply-accumulate:
    /// `acc + conj?(a) * conj?(b)`.
    #[inline(always)]
    fn conj_mul_add<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self, acc: Self) -> Self {
        acc + Self::conj_mul::<CONJ_A, CONJ_B>(a, b)
    }
}

impl Scalar for f32 {
    const ADD_COST: usize = 1;
    const MUL_COST: usize = 1;
    const READ_COST: usize = 1;
}

impl Scalar for f64 {
    const ADD_COST: usize = 1;
    const MUL_COST: usize = 1;
    const READ_COST: usize = 1;
}

impl<T> Scalar for Complex<T>
where
    T: num::traits::Float + Debug + 'static,
{
    // One complex add is two real adds; one complex multiply is four real
    // multiplies and two real adds; a coefficient is two reals wide.
    const ADD_COST: usize = 2;
    const MUL_COST: usize = 6;
    const READ_COST: usize = 2;

    #[inline(always)]
    fn conj(self) -> Self {
        Complex::new(self.re, -self.im)
    }

    #[inline(always)]
    fn conj_mul<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self) -> Self {
        let (ar, ai, br, bi) = (a.re, a.im, b.re, b.im);
        match (CONJ_A, CONJ_B) {
            (false, false) => Complex::new(ar * br - ai * bi, ar * bi + ai * br),
            (true, false) => Complex::new(ar * br + ai * bi, ar * bi - ai * br),
            (false, true) => Complex::new(ar * br + ai * bi, ai * br - ar * bi),
            (true, true) => Complex::new(ar * br - ai * bi, -(ar * bi) - ai * br),
        }
    }

    #[inline(always)]
    fn conj_mul_add<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self, acc: Self) -> Self {
        acc + Self::conj_mul::<CONJ_A, CONJ_B>(a, b)
    }
}

/// A scalar type bound to the packet implementation the build selected for
/// it.
///
/// Every scalar usable in an expression implements this; types whose build
/// configuration provides no vector register get [`scalar::ScalarPacket`],
/// which keeps them on the scalar strategy paths (its width is 1, so the
/// selector never chooses a vectorized mode worth taking).
pub trait SimdScalar: Scalar + 'static {
    /// The packet type holding lanes of this scalar on the active target.
    type Packet: Packet<Scalar = Self>;
}

/// Shorthand for the packet type selected for a scalar.
pub type PacketOf<T> = <T as SimdScalar>::Packet;

/// Pointer alignment check for a packet's aligned load/store operations.
pub trait Alignment<T> {
    /// Returns `true` if `ptr` meets the alignment required by the aligned
    /// load and store paths of the implementing packet type.
    fn is_aligned(ptr: *const T) -> bool;
}

/// The portable vector-register contract.
///
/// All kernels are written once against this trait; each implementation
/// wraps one hardware register type (or a bare scalar for the width-1
/// fallback). A packet has no identity beyond its bits: `Copy`, stack-only,
/// no long-term storage.
///
/// Elementwise arithmetic comes in through the standard operator traits;
/// for complex packets `Mul` and `Div` implement full complex products via
/// lane shuffles and sign-mask XOR, because lanes are interleaved
/// (real, imag) pairs and there is no native complex multiply instruction.
pub trait Packet:
    Copy
    + Clone
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Element type of one lane.
    type Scalar: Scalar;

    /// Number of scalar lanes per register. 1 for the scalar fallback.
    const LANES: usize;

    /// Byte alignment required by [`Packet::load_aligned`] and
    /// [`Packet::store_aligned`].
    const ALIGNMENT: usize;

    /// Broadcasts a scalar into every lane.
    fn splat(value: Self::Scalar) -> Self;

    /// Extracts lane 0.
    fn first(self) -> Self::Scalar;

    /// Loads `LANES` consecutive scalars from an `ALIGNMENT`-byte aligned
    /// pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be aligned to [`Packet::ALIGNMENT`] bytes and point to at
    /// least `LANES` readable scalars. A misaligned pointer is undefined
    /// behavior, not an error.
    unsafe fn load_aligned(ptr: *const Self::Scalar) -> Self;

    /// Loads `LANES` consecutive scalars from an arbitrary pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must point to at least `LANES` readable scalars.
    unsafe fn load_unaligned(ptr: *const Self::Scalar) -> Self;

    /// Dispatches to the aligned or unaligned load. `aligned` is expected
    /// to be a monomorphization-time constant so the branch folds away.
    ///
    /// # Safety
    ///
    /// As [`Packet::load_aligned`] when `aligned`, else as
    /// [`Packet::load_unaligned`].
    #[inline(always)]
    unsafe fn load(ptr: *const Self::Scalar, aligned: bool) -> Self {
        if aligned {
            Self::load_aligned(ptr)
        } else {
            Self::load_unaligned(ptr)
        }
    }

    /// Stores all lanes to an `ALIGNMENT`-byte aligned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be aligned to [`Packet::ALIGNMENT`] bytes and point to at
    /// least `LANES` writable scalars.
    unsafe fn store_aligned(self, ptr: *mut Self::Scalar);

    /// Stores all lanes to an arbitrary pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must point to at least `LANES` writable scalars.
    unsafe fn store_unaligned(self, ptr: *mut Self::Scalar);

    /// Dispatches to the aligned or unaligned store. `aligned` is expected
    /// to be a monomorphization-time constant so the branch folds away.
    ///
    /// # Safety
    ///
    /// As [`Packet::store_aligned`] when `aligned`, else as
    /// [`Packet::store_unaligned`].
    #[inline(always)]
    unsafe fn store(self, ptr: *mut Self::Scalar, aligned: bool) {
        if aligned {
            self.store_aligned(ptr)
        } else {
            self.store_unaligned(ptr)
        }
    }

    /// Lane-wise complex conjugate via a precomputed imaginary-lane sign
    /// mask; identity for real packets.
    fn conjugate(self) -> Self;

    /// Fused (where the hardware provides it) multiply-accumulate:
    /// `a * b + acc`.
    #[inline(always)]
    fn mul_add(a: Self, b: Self, acc: Self) -> Self {
        a * b + acc
    }

    /// Conditionally-conjugate multiply: `conj?(a) * conj?(b)` per lane.
    ///
    /// All four sign configurations are separate arithmetic identities; the
    /// direct forms avoid the extra masking step a `conjugate`-then-`mul`
    /// composition would pay.
    fn conj_mul<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self) -> Self;

    /// Conditionally-conjugate multiply-accumulate:
    /// `acc + conj?(a) * conj?(b)` per lane.
    #[inline(always)]
    fn conj_mul_add<const CONJ_A: bool, const CONJ_B: bool>(a: Self, b: Self, acc: Self) -> Self {
        acc + Self::conj_mul::<CONJ_A, CONJ_B>(a, b)
    }

    /// Horizontal sum of all lanes into one scalar.
    ///
    /// Complex implementations permute the high and low register halves and
    /// add, so real and imaginary sub-lanes never cross-contaminate.
    fn reduce_add(self) -> Self::Scalar;

    /// Horizontal add of two packets into one: adjacent lane pairs of each
    /// operand are summed, `a`'s results in the low half and `b`'s in the
    /// high half. Width-1 packets return `a` unchanged.
    fn reduce_add_pairs(a: Self, b: Self) -> Self;

    /// Reverses lane order.
    fn reverse(self) -> Self;

    /// Produces the packet that a load `OFFSET` lanes past `prev` would
    /// return, combining `prev`'s high lanes with `next`'s low lanes.
    ///
    /// `OFFSET` must be less than `LANES`; `OFFSET == 0` returns `prev`.
    fn align_with<const OFFSET: usize>(prev: Self, next: Self) -> Self;
}

#[cfg(sse)]
mod select {
    pub type F32Packet = super::sse::f32x4::F32x4;
    pub type F64Packet = super::sse::f64x2::F64x2;
    pub type C32Packet = super::sse::c32x2::C32x2;
    pub type C64Packet = super::sse::c64x1::C64x1;
}

#[cfg(neon)]
mod select {
    use num::complex::Complex;

    use super::scalar::ScalarPacket;

    pub type F32Packet = super::neon::f32x4::F32x4;
    pub type F64Packet = ScalarPacket<f64>;
    pub type C32Packet = ScalarPacket<Complex<f32>>;
    pub type C64Packet = ScalarPacket<Complex<f64>>;
}

#[cfg(not(any(sse, neon)))]
mod select {
    use num::complex::Complex;

    use super::scalar::ScalarPacket;

    pub type F32Packet = ScalarPacket<f32>;
    pub type F64Packet = ScalarPacket<f64>;
    pub type C32Packet = ScalarPacket<Complex<f32>>;
    pub type C64Packet = ScalarPacket<Complex<f64>>;
}

impl SimdScalar for f32 {
    type Packet = select::F32Packet;
}

impl SimdScalar for f64 {
    type Packet = select::F64Packet;
}

impl SimdScalar for Complex<f32> {
    type Packet = select::C32Packet;
}

impl SimdScalar for Complex<f64> {
    type Packet = select::C64Packet;
}
