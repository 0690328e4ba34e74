//! Product coefficient kernel.
//!
//! [`Product`] is the expression a small or fixed-size matrix product is
//! materialized through: one output coefficient ([`Product::coeff_at`]) or
//! one packet of adjacent output coefficients ([`Product::packet_at`]) at
//! a time, instead of a blocked temporary-forming algorithm.
//!
//! The kernel variant for each instantiation is decided from compile-time
//! operand metadata, mirroring the strategy rules in [`crate::strategy`]:
//!
//! - a compile-time inner dimension whose accumulation cost fits
//!   [`crate::UNROLLING_LIMIT`] is unrolled into a flat recursion;
//! - a dynamic inner dimension runs a loop, after asserting the operand is
//!   not empty;
//! - when the lhs is row-major, the rhs column-major, and both are
//!   packet-capable, the inner accumulation is vectorized
//!   ([`Vectorization::Inner`][crate::strategy::Vectorization]); dynamic
//!   degenerate (single-row / single-column) cases delegate to the dot
//!   kernel;
//! - the packet path broadcasts the operand *opposite* the evaluation
//!   order so the non-broadcast operand is always read with stride-1
//!   packet loads; broadcasting the wrong side would force gather-style
//!   strided loads.
//!
//! The two const generic flags select one of the four conjugation variants
//! (plain, conjugate-lhs, conjugate-rhs, both), closing over the
//! Hermitian-adjoint product forms without code duplication.
//!
//! Shape compatibility is asserted once in [`Product::new`]; the kernels
//! themselves never check dimensions.

use num::traits::Zero;

use crate::dense::{min_dim, mul_dims, ColVec, Dense, RowVec};
use crate::dot::dot_with_conj;
use crate::simd::{Packet, PacketOf, Scalar, PACKET_ALIGN};
use crate::strategy::Vectorization;
use crate::UNROLLING_LIMIT;

/// `true` when a dimension is dynamic or a whole number of packets.
const fn lane_multiple(dim: Option<usize>, lanes: usize) -> bool {
    match dim {
        Some(d) => d % lanes == 0,
        None => true,
    }
}

/// `true` only when a dimension is compile-time known and a whole number
/// of packets.
const fn known_lane_multiple(dim: Option<usize>, lanes: usize) -> bool {
    match dim {
        Some(d) => d % lanes == 0,
        None => false,
    }
}

/// Per-coefficient read cost of a product:
/// `inner*(mul + lhs_read + rhs_read) + (inner-1)*add`, dynamic when any
/// input is.
const fn product_read_cost(
    inner: Option<usize>,
    mul_cost: usize,
    add_cost: usize,
    lhs_cost: Option<usize>,
    rhs_cost: Option<usize>,
) -> Option<usize> {
    match (inner, lhs_cost, rhs_cost) {
        (Some(0), _, _) => Some(0),
        (Some(n), Some(l), Some(r)) => Some(n * (mul_cost + l + r) + (n - 1) * add_cost),
        _ => None,
    }
}

/// Matrix-product expression evaluated coefficient by coefficient.
///
/// `CONJ_LHS` / `CONJ_RHS` select the conjugation variant applied to each
/// accumulated term.
pub struct Product<'a, L, R, const CONJ_LHS: bool = false, const CONJ_RHS: bool = false> {
    lhs: &'a L,
    rhs: &'a R,
}

impl<'a, L, R, const CONJ_LHS: bool, const CONJ_RHS: bool> Product<'a, L, R, CONJ_LHS, CONJ_RHS>
where
    L: Dense,
    R: Dense<Scalar = L::Scalar>,
{
    const LANES: usize = <PacketOf<L::Scalar> as Packet>::LANES;

    /// Contracted dimension, when compile-time known.
    pub const INNER_SIZE: Option<usize> = min_dim(L::COLS, R::ROWS);

    /// Whether the inner accumulation of a single coefficient can run on
    /// packets: lhs rows and rhs columns must both be stride-1 along the
    /// contracted dimension.
    pub const CAN_VECTORIZE_INNER: bool =
        L::ROW_MAJOR && !R::ROW_MAJOR && L::PACKET_ACCESS && R::PACKET_ACCESS;

    /// Vectorization mode of the coefficient accumulation. The generic
    /// linear rule never applies here; a product coefficient either
    /// vectorizes along the contracted dimension or not at all.
    pub const VECTORIZATION: Vectorization = if Self::CAN_VECTORIZE_INNER {
        Vectorization::Inner
    } else {
        Vectorization::None
    };

    /// Whether packets of adjacent output coefficients can be produced
    /// down a column (column-major evaluation driven by the lhs).
    pub const CAN_VECTORIZE_LHS: bool =
        !L::ROW_MAJOR && L::PACKET_ACCESS && lane_multiple(L::ROWS, Self::LANES);

    /// Whether packets of adjacent output coefficients can be produced
    /// along a row (row-major evaluation driven by the rhs).
    pub const CAN_VECTORIZE_RHS: bool =
        R::ROW_MAJOR && R::PACKET_ACCESS && lane_multiple(R::COLS, Self::LANES);

    /// Storage order the packet path evaluates in.
    pub const EVAL_ROW_MAJOR: bool = R::ROW_MAJOR && !Self::CAN_VECTORIZE_LHS;

    const READ_COST: Option<usize> = product_read_cost(
        Self::INNER_SIZE,
        <L::Scalar as Scalar>::MUL_COST,
        <L::Scalar as Scalar>::ADD_COST,
        L::COEFF_READ_COST,
        R::COEFF_READ_COST,
    );

    const UNROLL: bool = match Self::READ_COST {
        Some(cost) => cost <= UNROLLING_LIMIT,
        None => false,
    };

    // Aligned loads along the inner dimension require every lhs row (and
    // rhs column) to start on a register boundary.
    const INNER_ALIGNED: bool =
        L::ALIGNED && R::ALIGNED && known_lane_multiple(Self::INNER_SIZE, Self::LANES);

    /// Wraps two conforming operands.
    ///
    /// The inner-dimension agreement is the caller contract checked here,
    /// once, at the boundary; no kernel below re-checks it.
    pub fn new(lhs: &'a L, rhs: &'a R) -> Self {
        assert!(
            lhs.cols() == rhs.rows(),
            "invalid matrix product: inner dimensions must agree"
        );
        Self { lhs, rhs }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.lhs.rows()
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.rhs.cols()
    }

    /// Computes the output coefficient at `(row, col)`.
    #[inline]
    pub fn coeff_at(&self, row: usize, col: usize) -> L::Scalar {
        match Self::VECTORIZATION {
            Vectorization::Inner => match Self::INNER_SIZE {
                Some(inner) if Self::UNROLL => self.coeff_inner_vectorized(row, col, inner),
                _ => self.coeff_vectorized_dyn(row, col),
            },
            _ => match Self::INNER_SIZE {
                // An inner size of zero is a degenerate instantiation; it
                // yields the additive identity instead of recursing.
                Some(0) if Self::UNROLL => L::Scalar::zero(),
                Some(inner) if Self::UNROLL => self.coeff_scalar_unrolled(inner - 1, row, col),
                _ => self.coeff_scalar_dyn(row, col),
            },
        }
    }

    /// Unrolled scalar accumulation of `lhs(row, k) * rhs(k, col)` for
    /// `k` in `[0, k]`; the base case initializes the accumulator directly
    /// rather than adding to an undefined value.
    #[inline(always)]
    fn coeff_scalar_unrolled(&self, k: usize, row: usize, col: usize) -> L::Scalar {
        let term_lhs = self.lhs.coeff(row, k);
        let term_rhs = self.rhs.coeff(k, col);
        if k == 0 {
            L::Scalar::conj_mul::<CONJ_LHS, CONJ_RHS>(term_lhs, term_rhs)
        } else {
            L::Scalar::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                term_lhs,
                term_rhs,
                self.coeff_scalar_unrolled(k - 1, row, col),
            )
        }
    }

    /// Unrolled scalar accumulation over `k` in `[stop, k]` only; the tail
    /// companion of the vectorized prefix.
    #[inline(always)]
    fn coeff_scalar_tail(&self, k: usize, stop: usize, row: usize, col: usize) -> L::Scalar {
        let term = L::Scalar::conj_mul::<CONJ_LHS, CONJ_RHS>(
            self.lhs.coeff(row, k),
            self.rhs.coeff(k, col),
        );
        if k == stop {
            term
        } else {
            term + self.coeff_scalar_tail(k - 1, stop, row, col)
        }
    }

    /// Runtime scalar accumulation for a dynamic inner dimension.
    fn coeff_scalar_dyn(&self, row: usize, col: usize) -> L::Scalar {
        let inner = self.lhs.cols();
        assert!(inner > 0, "product of an uninitialized (empty) matrix");

        let mut res = L::Scalar::conj_mul::<CONJ_LHS, CONJ_RHS>(
            self.lhs.coeff(row, 0),
            self.rhs.coeff(0, col),
        );
        for k in 1..inner {
            res = L::Scalar::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                self.lhs.coeff(row, k),
                self.rhs.coeff(k, col),
                res,
            );
        }
        res
    }

    #[inline(always)]
    unsafe fn lhs_packet(&self, row: usize, k: usize) -> PacketOf<L::Scalar> {
        if Self::INNER_ALIGNED {
            self.lhs.packet::<true>(row, k)
        } else {
            self.lhs.packet::<false>(row, k)
        }
    }

    #[inline(always)]
    unsafe fn rhs_packet(&self, k: usize, col: usize) -> PacketOf<L::Scalar> {
        if Self::INNER_ALIGNED {
            self.rhs.packet::<true>(k, col)
        } else {
            self.rhs.packet::<false>(k, col)
        }
    }

    /// Inner-vectorized accumulation for a fixed inner dimension: a
    /// running packet of conditionally-conjugated multiply-adds over the
    /// lane-multiple prefix, one horizontal reduction, and the remainder
    /// through the plain scalar recursion.
    #[inline(always)]
    fn coeff_inner_vectorized(&self, row: usize, col: usize, inner: usize) -> L::Scalar {
        if inner == 0 {
            return L::Scalar::zero();
        }

        let vector_size = (inner / Self::LANES) * Self::LANES;
        if vector_size == 0 {
            return self.coeff_scalar_unrolled(inner - 1, row, col);
        }

        let acc = self.inner_packet_unrolled(vector_size - Self::LANES, row, col);
        let mut res = acc.reduce_add();
        if vector_size < inner {
            res = res + self.coeff_scalar_tail(inner - 1, vector_size, row, col);
        }
        res
    }

    /// Unrolled packet accumulation over `k` in `[0, k]`, stepping one
    /// packet width at a time.
    #[inline(always)]
    fn inner_packet_unrolled(&self, k: usize, row: usize, col: usize) -> PacketOf<L::Scalar> {
        let term_lhs = unsafe { self.lhs_packet(row, k) };
        let term_rhs = unsafe { self.rhs_packet(k, col) };
        if k == 0 {
            PacketOf::<L::Scalar>::conj_mul::<CONJ_LHS, CONJ_RHS>(term_lhs, term_rhs)
        } else {
            PacketOf::<L::Scalar>::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                term_lhs,
                term_rhs,
                self.inner_packet_unrolled(k - Self::LANES, row, col),
            )
        }
    }

    /// Dynamic inner-vectorized coefficient: vector-times-vector is the
    /// common case here and delegates to the dedicated dot kernel over
    /// row/column views instead of duplicating the general loop.
    fn coeff_vectorized_dyn(&self, row: usize, col: usize) -> L::Scalar {
        assert!(
            self.lhs.cols() > 0,
            "product of an uninitialized (empty) matrix"
        );

        match (L::ROWS, R::COLS) {
            (Some(1), Some(1)) => dot_with_conj::<_, _, CONJ_LHS, CONJ_RHS>(self.lhs, self.rhs),
            (Some(1), _) => {
                dot_with_conj::<_, _, CONJ_LHS, CONJ_RHS>(self.lhs, &ColVec::new(self.rhs, col))
            }
            (_, Some(1)) => {
                dot_with_conj::<_, _, CONJ_LHS, CONJ_RHS>(&RowVec::new(self.lhs, row), self.rhs)
            }
            _ => dot_with_conj::<_, _, CONJ_LHS, CONJ_RHS>(
                &RowVec::new(self.lhs, row),
                &ColVec::new(self.rhs, col),
            ),
        }
    }

    /// Computes one packet of adjacent output coefficients starting at
    /// `(row, col)` along the evaluation order.
    ///
    /// Row-major evaluation broadcasts the lhs coefficient against rhs
    /// packets; column-major evaluation broadcasts the rhs coefficient
    /// against lhs packets. Either way the non-broadcast operand is read
    /// with stride-1 packet loads.
    ///
    /// # Safety
    ///
    /// `LANES` output coefficients must exist from `(row, col)` along the
    /// evaluation order, and `ALIGNED_LOAD` must only be passed when the
    /// non-broadcast operand's storage guarantees it at this position.
    #[inline]
    pub unsafe fn packet_at<const ALIGNED_LOAD: bool>(
        &self,
        row: usize,
        col: usize,
    ) -> PacketOf<L::Scalar> {
        if Self::EVAL_ROW_MAJOR {
            match Self::INNER_SIZE {
                Some(0) if Self::UNROLL => PacketOf::<L::Scalar>::splat(L::Scalar::zero()),
                Some(inner) if Self::UNROLL => {
                    self.packet_row_major_unrolled::<ALIGNED_LOAD>(inner - 1, row, col)
                }
                _ => self.packet_row_major_dyn::<ALIGNED_LOAD>(row, col),
            }
        } else {
            match Self::INNER_SIZE {
                Some(0) if Self::UNROLL => PacketOf::<L::Scalar>::splat(L::Scalar::zero()),
                Some(inner) if Self::UNROLL => {
                    self.packet_col_major_unrolled::<ALIGNED_LOAD>(inner - 1, row, col)
                }
                _ => self.packet_col_major_dyn::<ALIGNED_LOAD>(row, col),
            }
        }
    }

    #[inline(always)]
    unsafe fn packet_row_major_unrolled<const ALIGNED_LOAD: bool>(
        &self,
        k: usize,
        row: usize,
        col: usize,
    ) -> PacketOf<L::Scalar> {
        let broadcast = PacketOf::<L::Scalar>::splat(self.lhs.coeff(row, k));
        let term = self.rhs.packet::<ALIGNED_LOAD>(k, col);
        if k == 0 {
            PacketOf::<L::Scalar>::conj_mul::<CONJ_LHS, CONJ_RHS>(broadcast, term)
        } else {
            PacketOf::<L::Scalar>::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                broadcast,
                term,
                self.packet_row_major_unrolled::<ALIGNED_LOAD>(k - 1, row, col),
            )
        }
    }

    #[inline(always)]
    unsafe fn packet_col_major_unrolled<const ALIGNED_LOAD: bool>(
        &self,
        k: usize,
        row: usize,
        col: usize,
    ) -> PacketOf<L::Scalar> {
        let term = self.lhs.packet::<ALIGNED_LOAD>(row, k);
        let broadcast = PacketOf::<L::Scalar>::splat(self.rhs.coeff(k, col));
        if k == 0 {
            PacketOf::<L::Scalar>::conj_mul::<CONJ_LHS, CONJ_RHS>(term, broadcast)
        } else {
            PacketOf::<L::Scalar>::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                term,
                broadcast,
                self.packet_col_major_unrolled::<ALIGNED_LOAD>(k - 1, row, col),
            )
        }
    }

    unsafe fn packet_row_major_dyn<const ALIGNED_LOAD: bool>(
        &self,
        row: usize,
        col: usize,
    ) -> PacketOf<L::Scalar> {
        let inner = self.lhs.cols();
        assert!(inner > 0, "product of an uninitialized (empty) matrix");

        let mut res = PacketOf::<L::Scalar>::conj_mul::<CONJ_LHS, CONJ_RHS>(
            PacketOf::<L::Scalar>::splat(self.lhs.coeff(row, 0)),
            self.rhs.packet::<ALIGNED_LOAD>(0, col),
        );
        for k in 1..inner {
            res = PacketOf::<L::Scalar>::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                PacketOf::<L::Scalar>::splat(self.lhs.coeff(row, k)),
                self.rhs.packet::<ALIGNED_LOAD>(k, col),
                res,
            );
        }
        res
    }

    unsafe fn packet_col_major_dyn<const ALIGNED_LOAD: bool>(
        &self,
        row: usize,
        col: usize,
    ) -> PacketOf<L::Scalar> {
        let inner = self.lhs.cols();
        assert!(inner > 0, "product of an uninitialized (empty) matrix");

        let mut res = PacketOf::<L::Scalar>::conj_mul::<CONJ_LHS, CONJ_RHS>(
            self.lhs.packet::<ALIGNED_LOAD>(row, 0),
            PacketOf::<L::Scalar>::splat(self.rhs.coeff(0, col)),
        );
        for k in 1..inner {
            res = PacketOf::<L::Scalar>::conj_mul_add::<CONJ_LHS, CONJ_RHS>(
                self.lhs.packet::<ALIGNED_LOAD>(row, k),
                PacketOf::<L::Scalar>::splat(self.rhs.coeff(k, col)),
                res,
            );
        }
        res
    }

    /// Materializes the product into column-major storage of leading
    /// dimension `rows()`, using the packet path down each column when the
    /// product's flags allow it and scalar evaluation otherwise.
    ///
    /// # Safety
    ///
    /// `dst` must point to `rows() * cols()` writable scalars.
    pub(crate) unsafe fn fill_col_major(&self, dst: *mut L::Scalar) {
        let rows = self.rows();
        let cols = self.cols();
        let lanes = Self::LANES;

        if Self::PACKET_ACCESS && !Self::EVAL_ROW_MAJOR {
            // Column starts land on register boundaries only when every
            // column is a whole number of packets.
            let rows_are_lane_multiple = rows % lanes == 0;
            let aligned_loads = L::ALIGNED && rows_are_lane_multiple;
            let aligned_stores =
                rows_are_lane_multiple && (dst as usize) % PACKET_ALIGN == 0;

            let vector_rows = (rows / lanes) * lanes;
            for col in 0..cols {
                let col_ptr = dst.add(col * rows);
                let mut row = 0;
                while row < vector_rows {
                    let p = if aligned_loads {
                        self.packet_at::<true>(row, col)
                    } else {
                        self.packet_at::<false>(row, col)
                    };
                    p.store(col_ptr.add(row), aligned_stores);
                    row += lanes;
                }
                for row in vector_rows..rows {
                    *col_ptr.add(row) = self.coeff_at(row, col);
                }
            }
        } else {
            for col in 0..cols {
                let col_ptr = dst.add(col * rows);
                for row in 0..rows {
                    *col_ptr.add(row) = self.coeff_at(row, col);
                }
            }
        }
    }
}

impl<L, R, const CONJ_LHS: bool, const CONJ_RHS: bool> Dense for Product<'_, L, R, CONJ_LHS, CONJ_RHS>
where
    L: Dense,
    R: Dense<Scalar = L::Scalar>,
{
    type Scalar = L::Scalar;

    const ROWS: Option<usize> = L::ROWS;
    const COLS: Option<usize> = R::COLS;
    const SIZE: Option<usize> = mul_dims(L::ROWS, R::COLS);
    const ROW_MAJOR: bool = Self::EVAL_ROW_MAJOR;
    const PACKET_ACCESS: bool = Self::CAN_VECTORIZE_LHS || Self::CAN_VECTORIZE_RHS;
    // Index-based access works through the coefficient kernel, but
    // index-based *packet* access cannot be offered, so the flat-traversal
    // flag stays off.
    const LINEAR_ACCESS: bool = false;
    const ALIGNED: bool = L::ALIGNED && R::ALIGNED;
    const COEFF_READ_COST: Option<usize> = Self::READ_COST;

    #[inline(always)]
    fn rows(&self) -> usize {
        Product::rows(self)
    }

    #[inline(always)]
    fn cols(&self) -> usize {
        Product::cols(self)
    }

    #[inline(always)]
    fn coeff(&self, row: usize, col: usize) -> L::Scalar {
        self.coeff_at(row, col)
    }

    #[inline(always)]
    unsafe fn packet<const ALIGNED_LOAD: bool>(
        &self,
        row: usize,
        col: usize,
    ) -> PacketOf<L::Scalar> {
        self.packet_at::<ALIGNED_LOAD>(row, col)
    }
}
