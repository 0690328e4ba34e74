//! 128-bit x86 SIMD packet implementations.
//!
//! This module provides the packet types backed by the SSE register file
//! (compiled with `-C target-feature=+sse4.1,+ssse3,+sse3`, configured
//! automatically by the build script):
//!
//! - [`f32x4::F32x4`]: 4 packed single-precision lanes
//! - [`f64x2::F64x2`]: 2 packed double-precision lanes
//! - [`c32x2::C32x2`]: 2 packed `Complex<f32>` lanes, interleaved
//!   (real, imag) pairs in one `__m128`
//! - [`c64x1::C64x1`]: 1 `Complex<f64>` lane in one `__m128d`
//!
//! The complex types implement full complex multiplication, division, and
//! conjugation with lane shuffles and sign-mask XOR rather than four
//! independent scalar multiplies.
//!
//! # Architecture Requirements
//!
//! - **Target Architecture**: x86 or x86_64
//! - **Memory Alignment**: aligned loads and stores require 16-byte
//!   boundaries
//! - **Runtime Detection**: the build system detects SSE availability and
//!   compiles this module only when present

pub mod c32x2;
pub mod c64x1;
pub mod f32x4;
pub mod f64x2;

/// SSE memory alignment requirement in bytes.
///
/// Aligned load and store instructions on the 128-bit register file require
/// 16-byte boundaries; this constant defines that requirement for every
/// packet type in this module.
pub(crate) const SSE_ALIGNMENT: usize = 16;
