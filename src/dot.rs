//! Dot-product kernel.
//!
//! The product kernel's dynamic inner-vectorized paths delegate degenerate
//! vector-times-vector cases here instead of duplicating the general loop:
//! vector operands are the common case for dynamic products and merit
//! their own traversal. The kernel is also exposed as [`dot`] for direct
//! use.
//!
//! The traversal is the linearly-vectorized looped shape of the reduction
//! kernel: a packet prefix over the largest lane multiple combined with
//! conditionally-conjugated fused multiply-adds, one horizontal reduction,
//! then a scalar tail. Operands that are not packet-capable (a strided row
//! view over a column-major host, for instance) take the scalar loop.

use num::traits::Zero;

use crate::dense::{packet_at_linear, Dense};
use crate::simd::{Packet, PacketOf, Scalar};

/// Algebraic (unconjugated) dot product of two equal-length vector
/// expressions.
///
/// Operands must be vectors (one row or one column); their lengths must
/// agree. Both are caller contracts, checked here at the boundary.
#[inline]
pub fn dot<L, R>(lhs: &L, rhs: &R) -> L::Scalar
where
    L: Dense,
    R: Dense<Scalar = L::Scalar>,
{
    assert!(
        (lhs.rows() == 1 || lhs.cols() == 1) && (rhs.rows() == 1 || rhs.cols() == 1),
        "dot product operands must be vectors"
    );
    assert!(
        lhs.size() == rhs.size(),
        "dot product operands must have the same length"
    );
    dot_with_conj::<L, R, false, false>(lhs, rhs)
}

/// Dot product with per-operand conjugation flags, shared with the product
/// kernel. An empty pair of operands yields the additive identity; the
/// product kernel asserts non-emptiness before delegating here.
#[inline]
pub(crate) fn dot_with_conj<L, R, const CONJ_LHS: bool, const CONJ_RHS: bool>(
    lhs: &L,
    rhs: &R,
) -> L::Scalar
where
    L: Dense,
    R: Dense<Scalar = L::Scalar>,
{
    let lanes = <PacketOf<L::Scalar> as Packet>::LANES;
    let size = lhs.size();

    let vectorize =
        L::PACKET_ACCESS && R::PACKET_ACCESS && L::LINEAR_ACCESS && R::LINEAR_ACCESS;

    if vectorize && size >= lanes {
        let vector_size = (size / lanes) * lanes;

        let mut acc = PacketOf::<L::Scalar>::conj_mul::<CONJ_LHS, CONJ_RHS>(
            unsafe { packet_at_linear(lhs, 0) },
            unsafe { packet_at_linear(rhs, 0) },
        );
        let mut index = lanes;
        while index < vector_size {
            acc = PacketOf::<L::Scalar>::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                unsafe { packet_at_linear(lhs, index) },
                unsafe { packet_at_linear(rhs, index) },
                acc,
            );
            index += lanes;
        }

        let mut res = acc.reduce_add();
        for index in vector_size..size {
            res = L::Scalar::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                lhs.coeff_linear(index),
                rhs.coeff_linear(index),
                res,
            );
        }
        res
    } else {
        let mut res = L::Scalar::zero();
        for index in 0..size {
            res = L::Scalar::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                lhs.coeff_linear(index),
                rhs.coeff_linear(index),
                res,
            );
        }
        res
    }
}
