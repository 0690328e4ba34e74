//! Kernel-selection and SIMD-abstraction engine for dense linear algebra.
//!
//! This crate provides the two coefficient-level kernels at the bottom of
//! a dense linear-algebra stack, whole-expression reduction
//! ([`sum()`]/[`trace()`]) and the matrix-product coefficient kernel
//! ([`Product`]), together with the machinery that makes them fast
//! everywhere:
//!
//! - a portable packet (vector register) abstraction in [`simd`], with one
//!   implementation per instruction set and scalar type (real and complex)
//!   and a width-1 scalar fallback, selected at build time;
//! - a compile-time cost model in [`strategy`] that picks, per expression
//!   type, whether a kernel runs scalar or vectorized and looped or
//!   completely unrolled, with zero runtime dispatch.
//!
//! Expressions enter through the [`Dense`] capability contract in
//! [`dense`]; the matrix hosts in [`matrix`] are the in-crate
//! implementations of that contract.
//!
//! Every kernel is synchronous, single-threaded, and allocation-free;
//! parallelism exists only as scalar lanes inside one packet instruction.

pub mod dense;
pub mod dot;
pub mod matrix;
pub mod product;
pub mod simd;
pub mod strategy;
pub mod sum;

pub use dense::Dense;
pub use dot::dot;
pub use matrix::{DMatrix, Matrix};
pub use product::Product;
pub use sum::{sum, trace};

/// Cost budget above which a fixed-size traversal is no longer completely
/// unrolled (scaled by the packet width for vectorized traversals).
///
/// A build-time tuning knob: changing it affects code size and speed,
/// never results.
pub const UNROLLING_LIMIT: usize = 100;
