//! Cost model and traversal-strategy selection.
//!
//! The strategy for a kernel is a pair: a [`Vectorization`] mode and an
//! [`Unrolling`] mode. Both are pure functions of compile-time shape and
//! cost metadata (element count, per-coefficient read cost, packet width,
//! and the fixed unrolling budget [`crate::UNROLLING_LIMIT`]), evaluated
//! once per expression *type*. The kernels branch on the result; since
//! every input is a monomorphization-time constant, the branch folds away
//! and no strategy decision is ever re-evaluated inside a hot loop.
//!
//! The cost model is a crude proxy (cycles ≈ reads + adds) chosen for
//! compile-time decidability, not numerical accuracy: complete unrolling
//! removes loop overhead and frees register allocation across the whole
//! computation for small fixed-size expressions, but explodes code size
//! for large ones, so the budget caps it.

use crate::dense::Dense;
use crate::simd::{Packet, PacketOf, Scalar};
use crate::UNROLLING_LIMIT;

/// How a kernel traverses coefficients with vector registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vectorization {
    /// Scalar traversal; no packet operations.
    None,
    /// Packet traversal along the flattened coefficient order.
    Linear,
    /// Packet traversal along the contracted dimension of a product; picked
    /// by the product kernel from the storage-order compatibility of its
    /// operands, never by the generic rule in this module.
    Inner,
}

/// Whether a traversal is a runtime loop or a fully unrolled sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unrolling {
    /// Runtime loop over the coefficient range.
    Looped,
    /// Compile-time expansion into a flat sequence of operations with no
    /// loop-carried branch.
    Complete,
}

/// A complete traversal decision.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Traversal {
    pub vectorization: Vectorization,
    pub unrolling: Unrolling,
}

/// Unrolling budget, scaled by the packet width when vectorized (one
/// packet operation stands in for `lanes` scalar operations).
pub const fn unrolling_budget(vectorized: bool, lanes: usize) -> usize {
    if vectorized {
        UNROLLING_LIMIT * lanes
    } else {
        UNROLLING_LIMIT
    }
}

/// Unrolling decision from an element count and per-coefficient read cost.
///
/// Effective cost is `n*read + (n-1)*add`. A dynamic size or dynamic cost
/// forces [`Unrolling::Looped`] regardless of budget.
pub const fn unrolling_for(
    size: Option<usize>,
    read_cost: Option<usize>,
    add_cost: usize,
    budget: usize,
) -> Unrolling {
    match (size, read_cost) {
        (Some(0), _) => Unrolling::Complete,
        (Some(n), Some(read)) => {
            let cost = n * read + (n - 1) * add_cost;
            if cost <= budget {
                Unrolling::Complete
            } else {
                Unrolling::Looped
            }
        }
        _ => Unrolling::Looped,
    }
}

/// Traversal decision for linear (flattened) kernels such as the
/// reduction: vectorize linearly iff the expression supports both packet
/// access and flat indexing, then unroll iff the effective cost fits the
/// (scaled) budget.
pub const fn linear_traversal<E: Dense>() -> Traversal {
    let lanes = <PacketOf<E::Scalar> as Packet>::LANES;

    let vectorization = if E::PACKET_ACCESS && E::LINEAR_ACCESS {
        Vectorization::Linear
    } else {
        Vectorization::None
    };

    let vectorized = matches!(vectorization, Vectorization::Linear);
    let unrolling = unrolling_for(
        E::SIZE,
        E::COEFF_READ_COST,
        <E::Scalar as Scalar>::ADD_COST,
        unrolling_budget(vectorized, lanes),
    );

    Traversal {
        vectorization,
        unrolling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_size_forces_looped() {
        assert_eq!(
            unrolling_for(None, Some(1), 1, unrolling_budget(false, 1)),
            Unrolling::Looped
        );
        assert_eq!(
            unrolling_for(Some(4), None, 1, unrolling_budget(false, 1)),
            Unrolling::Looped
        );
    }

    #[test]
    fn small_fixed_sizes_unroll_completely() {
        // 16 reads + 15 adds = 31 <= 100
        assert_eq!(
            unrolling_for(Some(16), Some(1), 1, unrolling_budget(false, 1)),
            Unrolling::Complete
        );
    }

    #[test]
    fn large_fixed_sizes_stay_looped() {
        // 64 reads + 63 adds = 127 > 100
        assert_eq!(
            unrolling_for(Some(64), Some(1), 1, unrolling_budget(false, 1)),
            Unrolling::Looped
        );
    }

    #[test]
    fn vectorization_scales_the_budget() {
        // At width 4 the budget grows to 400, so 64 elements still unroll.
        assert_eq!(
            unrolling_for(Some(64), Some(1), 1, unrolling_budget(true, 4)),
            Unrolling::Complete
        );
    }

    #[test]
    fn empty_expressions_are_trivially_unrolled() {
        assert_eq!(
            unrolling_for(Some(0), Some(1), 1, unrolling_budget(false, 1)),
            Unrolling::Complete
        );
    }
}
