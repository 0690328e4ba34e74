//! ARM NEON SIMD packet implementation.
//!
//! This module provides the packet type backed by the AArch64 Advanced SIMD
//! (NEON) register file:
//!
//! - [`f32x4::F32x4`]: 4 packed single-precision lanes
//!
//! NEON covers f32 only in this crate; f64 and the complex scalar types
//! fall back to the width-1 scalar packet on AArch64 targets, which keeps
//! them on the scalar strategy paths.
//!
//! # Architecture Requirements
//!
//! - **Target Architecture**: AArch64
//! - **Memory Alignment**: NEON loads and stores have no alignment
//!   requirement; 16-byte alignment remains a performance hint
//! - **Runtime Detection**: the build system detects NEON availability and
//!   compiles this module only when present

pub mod f32x4;

/// NEON preferred alignment in bytes.
pub(crate) const NEON_ALIGNMENT: usize = 16;
