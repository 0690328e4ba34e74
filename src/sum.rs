//! Whole-expression reduction kernel.
//!
//! [`sum`] computes the scalar sum of all coefficients of a dense
//! expression under one of four traversal strategies, chosen per
//! expression type by [`crate::strategy::linear_traversal`]:
//!
//! - scalar looped, scalar completely unrolled, linearly-vectorized
//!   looped, linearly-vectorized completely unrolled.
//!
//! All four are algebraically equivalent summations differing only in
//! grouping order, so the result is invariant under the strategy choice up
//! to floating-point reassociation.
//!
//! The sum of an empty expression is the additive identity, checked
//! explicitly in every strategy; emptiness is not a contract violation
//! here (unlike the product kernel's dynamic paths, where an empty inner
//! dimension indicates an uninitialized operand).

use num::traits::Zero;

use crate::dense::{packet_at_linear, Dense, Diag};
use crate::simd::{Packet, PacketOf};
use crate::strategy::{linear_traversal, Unrolling, Vectorization};

/// Sum of all coefficients of the expression.
///
/// The traversal strategy is resolved from compile-time metadata before
/// codegen; the `match` below folds to a single call in every
/// monomorphization.
#[inline]
pub fn sum<E: Dense>(mat: &E) -> E::Scalar {
    let traversal = linear_traversal::<E>();
    match (traversal.vectorization, traversal.unrolling) {
        (Vectorization::Linear, Unrolling::Complete) => sum_vectorized_complete(mat),
        (Vectorization::Linear, Unrolling::Looped) => sum_vectorized_looped(mat),
        (_, Unrolling::Complete) => sum_scalar_complete(mat),
        (_, Unrolling::Looped) => sum_scalar_looped(mat),
    }
}

/// Sum of the main-diagonal coefficients.
///
/// Defined on any shape, square or not, over the `min(rows, cols)`
/// diagonal.
#[inline]
pub fn trace<E: Dense>(mat: &E) -> E::Scalar {
    sum(&Diag::new(mat))
}

/// Scalar looped traversal: first coefficient, rest of column 0, then the
/// remaining columns top-to-bottom, left-to-right. The explicit (row, col)
/// order matches arbitrary storage layouts without assuming flat indexing.
fn sum_scalar_looped<E: Dense>(mat: &E) -> E::Scalar {
    if mat.size() == 0 {
        return E::Scalar::zero();
    }

    let mut res = mat.coeff(0, 0);
    for row in 1..mat.rows() {
        res = res + mat.coeff(row, 0);
    }
    for col in 1..mat.cols() {
        for row in 0..mat.rows() {
            res = res + mat.coeff(row, col);
        }
    }
    res
}

/// Scalar complete unrolling over the fixed-size index range.
fn sum_scalar_complete<E: Dense>(mat: &E) -> E::Scalar {
    let Some(size) = E::SIZE else {
        unreachable!("complete unrolling requires a compile-time size")
    };
    if size == 0 {
        return E::Scalar::zero();
    }
    sum_scalar_unrolled(mat, 0, size)
}

/// Recursively halves `[start, start + len)` and adds the halves; the base
/// case reads one coefficient at the (row, col) its flat index denotes for
/// the expression's fixed row count. Halving bounds the recursion depth
/// logarithmically and balances the generated expression tree for the
/// optimizer.
#[inline(always)]
fn sum_scalar_unrolled<E: Dense>(mat: &E, start: usize, len: usize) -> E::Scalar {
    if len == 1 {
        let rows = match E::ROWS {
            Some(rows) => rows,
            None => mat.rows(),
        };
        mat.coeff(start % rows, start / rows)
    } else {
        let half = len / 2;
        sum_scalar_unrolled(mat, start, half) + sum_scalar_unrolled(mat, start + half, len - half)
    }
}

/// Linearly-vectorized looped traversal: accumulate whole packets along
/// the flat order up to the largest lane multiple, reduce once, then
/// resume scalar accumulation at the exact row and column where the
/// vectorized prefix stopped.
fn sum_vectorized_looped<E: Dense>(mat: &E) -> E::Scalar {
    let lanes = <PacketOf<E::Scalar> as Packet>::LANES;
    let size = mat.size();
    if size == 0 {
        return E::Scalar::zero();
    }

    let vector_size = (size / lanes) * lanes;
    let inner_size = if E::ROW_MAJOR { mat.cols() } else { mat.rows() };
    let outer_size = if E::ROW_MAJOR { mat.rows() } else { mat.cols() };

    let mut res;
    if size >= lanes {
        let mut packet_res = unsafe { packet_at_linear(mat, 0) };
        let mut index = lanes;
        while index < vector_size {
            packet_res = packet_res + unsafe { packet_at_linear(mat, index) };
            index += lanes;
        }
        res = packet_res.reduce_add();

        if vector_size == size {
            return res;
        }
    } else {
        // too small to vectorize anything
        res = E::Scalar::zero();
    }

    let outer = vector_size / inner_size;

    // finish the row or column the prefix stopped in
    for inner in (vector_size % inner_size)..inner_size {
        let (row, col) = if E::ROW_MAJOR {
            (outer, inner)
        } else {
            (inner, outer)
        };
        res = res + mat.coeff(row, col);
    }

    // then the remaining rows or columns
    for outer in (outer + 1)..outer_size {
        for inner in 0..inner_size {
            let (row, col) = if E::ROW_MAJOR {
                (outer, inner)
            } else {
                (inner, outer)
            };
            res = res + mat.coeff(row, col);
        }
    }

    res
}

/// Linearly-vectorized complete unrolling: the lane-multiple prefix is
/// unrolled in whole packets with a single reduction at the top; a
/// non-lane-multiple tail falls back to the scalar unroller, so every
/// fixed size is legal under this strategy.
fn sum_vectorized_complete<E: Dense>(mat: &E) -> E::Scalar {
    let lanes = <PacketOf<E::Scalar> as Packet>::LANES;
    let Some(size) = E::SIZE else {
        unreachable!("complete unrolling requires a compile-time size")
    };
    if size == 0 {
        return E::Scalar::zero();
    }

    let vector_size = (size / lanes) * lanes;
    if vector_size == 0 {
        return sum_scalar_unrolled(mat, 0, size);
    }

    let mut res = sum_vectorized_unrolled(mat, 0, vector_size).reduce_add();
    if vector_size < size {
        res = res + sum_scalar_unrolled(mat, vector_size, size - vector_size);
    }
    res
}

/// Packet analogue of [`sum_scalar_unrolled`]: recursive halving over a
/// whole number of packets, base case one full packet load.
#[inline(always)]
fn sum_vectorized_unrolled<E: Dense>(mat: &E, start: usize, len: usize) -> PacketOf<E::Scalar> {
    let lanes = <PacketOf<E::Scalar> as Packet>::LANES;
    debug_assert!(len % lanes == 0);

    if len == lanes {
        unsafe { packet_at_linear(mat, start) }
    } else {
        let half = (len / lanes / 2) * lanes;
        sum_vectorized_unrolled(mat, start, half) + sum_vectorized_unrolled(mat, start + half, len - half)
    }
}
