//! Column-major matrix hosts.
//!
//! Two owned matrix types exercise the kernels from this crate:
//!
//! - [`Matrix<T, R, C>`]: shape fixed in the type system, storage inline
//!   and 16-byte aligned. Fixed shapes feed the compile-time cost model,
//!   so small instances take the completely-unrolled kernel paths.
//! - [`DMatrix<T>`]: runtime shape over an aligned heap buffer
//!   ([`AlignedBuffer`]). Dynamic shapes force the looped strategies and
//!   the runtime-checked vectorized variants.
//!
//! Both are column-major, linear-indexable, and packet-capable whenever
//! the selected packet type is wider than one lane; the capability flags
//! on their [`Dense`] implementations are backed by the aligned storage.
//! Row-major expressions come from [`Transpose`] views rather than a
//! second storage order.
//!
//! The elementwise operators (`+`, `-`, negation, scalar scaling) are
//! plain materializing loops; expression fusion is out of scope for this
//! crate.

use std::ops::{Add, Index, Mul, Neg, Sub};

use num::traits::{One, Zero};

use crate::dense::{Dense, Transpose};
use crate::product::Product;
use crate::simd::utils::AlignedBuffer;
use crate::simd::{Packet, PacketOf, SimdScalar, PACKET_ALIGN};

// Inline storage carries the same guarantee the aligned heap buffer does.
const _: () = assert!(PACKET_ALIGN == 16);

/// Fixed-size column-major matrix with 16-byte-aligned inline storage.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C, align(16))]
pub struct Matrix<T, const R: usize, const C: usize> {
    /// `data[c][r]` is the coefficient at row `r`, column `c`.
    data: [[T; R]; C],
}

impl<T: SimdScalar, const R: usize, const C: usize> Matrix<T, R, C> {
    /// Builds a matrix from a coefficient function `f(row, col)`.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> T) -> Self {
        Self {
            data: std::array::from_fn(|c| std::array::from_fn(|r| f(r, c))),
        }
    }

    /// Builds a matrix from row-major nested arrays, matching the visual
    /// layout of the literal: `from_rows([[a, b], [c, d]])` puts `a` at
    /// (0, 0) and `b` at (0, 1).
    pub fn from_rows(rows: [[T; C]; R]) -> Self {
        Self::from_fn(|r, c| rows[r][c])
    }

    /// Matrix of zeros.
    pub fn zeros() -> Self {
        Self::from_fn(|_, _| T::zero())
    }

    /// Ones on the main diagonal, zeros elsewhere. Defined for any shape.
    pub fn identity() -> Self {
        Self::from_fn(|r, c| if r == c { T::one() } else { T::zero() })
    }

    /// Transposed (row-major) view of this matrix.
    #[inline(always)]
    pub fn transpose(&self) -> Transpose<'_, Self> {
        Transpose::new(self)
    }

    /// Sum of all coefficients.
    #[inline]
    pub fn sum(&self) -> T {
        crate::sum::sum(self)
    }

    /// Sum of the main-diagonal coefficients.
    #[inline]
    pub fn trace(&self) -> T {
        crate::sum::trace(self)
    }

    /// Scales every coefficient by `factor`.
    pub fn scale(&self, factor: T) -> Self {
        Self::from_fn(|r, c| self.coeff(r, c) * factor)
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *const T {
        self.data.as_ptr() as *const T
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr() as *mut T
    }
}

impl<T: SimdScalar, const R: usize, const C: usize> Dense for Matrix<T, R, C> {
    type Scalar = T;

    const ROWS: Option<usize> = Some(R);
    const COLS: Option<usize> = Some(C);
    const SIZE: Option<usize> = Some(R * C);
    const ROW_MAJOR: bool = false;
    const PACKET_ACCESS: bool = <PacketOf<T> as Packet>::LANES > 1;
    const LINEAR_ACCESS: bool = true;
    const ALIGNED: bool = true;
    const COEFF_READ_COST: Option<usize> = Some(T::READ_COST);

    #[inline(always)]
    fn rows(&self) -> usize {
        R
    }

    #[inline(always)]
    fn cols(&self) -> usize {
        C
    }

    #[inline(always)]
    fn coeff(&self, row: usize, col: usize) -> T {
        self.data[col][row]
    }

    #[inline(always)]
    fn coeff_linear(&self, index: usize) -> T {
        self.data[index / R][index % R]
    }

    #[inline(always)]
    unsafe fn packet<const ALIGNED_LOAD: bool>(&self, row: usize, col: usize) -> PacketOf<T> {
        debug_assert!(col * R + row + <PacketOf<T> as Packet>::LANES <= R * C);
        PacketOf::<T>::load(self.as_ptr().add(col * R + row), ALIGNED_LOAD)
    }

    #[inline(always)]
    unsafe fn packet_linear<const ALIGNED_LOAD: bool>(&self, index: usize) -> PacketOf<T> {
        debug_assert!(index + <PacketOf<T> as Packet>::LANES <= R * C);
        PacketOf::<T>::load(self.as_ptr().add(index), ALIGNED_LOAD)
    }
}

impl<T: SimdScalar, const R: usize, const C: usize> Index<(usize, usize)> for Matrix<T, R, C> {
    type Output = T;

    #[inline(always)]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[col][row]
    }
}

impl<T: SimdScalar, const R: usize, const C: usize> Add for &Matrix<T, R, C> {
    type Output = Matrix<T, R, C>;

    fn add(self, rhs: Self) -> Matrix<T, R, C> {
        Matrix::from_fn(|r, c| self.coeff(r, c) + rhs.coeff(r, c))
    }
}

impl<T: SimdScalar, const R: usize, const C: usize> Sub for &Matrix<T, R, C> {
    type Output = Matrix<T, R, C>;

    fn sub(self, rhs: Self) -> Matrix<T, R, C> {
        Matrix::from_fn(|r, c| self.coeff(r, c) - rhs.coeff(r, c))
    }
}

impl<T: SimdScalar, const R: usize, const C: usize> Neg for &Matrix<T, R, C> {
    type Output = Matrix<T, R, C>;

    fn neg(self) -> Matrix<T, R, C> {
        Matrix::from_fn(|r, c| -self.coeff(r, c))
    }
}

/// Matrix product through the coefficient kernel.
impl<T: SimdScalar, const R: usize, const K: usize, const C: usize> Mul<&Matrix<T, K, C>>
    for &Matrix<T, R, K>
{
    type Output = Matrix<T, R, C>;

    fn mul(self, rhs: &Matrix<T, K, C>) -> Matrix<T, R, C> {
        let product: Product<'_, _, _> = Product::new(self, rhs);
        let mut out = Matrix::zeros();
        unsafe { product.fill_col_major(out.as_mut_ptr()) };
        out
    }
}

/// Dynamic-size column-major matrix over packet-aligned heap storage.
#[derive(Clone, Debug)]
pub struct DMatrix<T: Copy> {
    data: AlignedBuffer<T>,
    rows: usize,
    cols: usize,
}

impl<T: SimdScalar> DMatrix<T> {
    /// Builds a matrix from a coefficient function `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        Self {
            data: AlignedBuffer::from_fn(rows * cols, |i| f(i % rows, i / rows)),
            rows,
            cols,
        }
    }

    /// Matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: AlignedBuffer::filled(rows * cols, T::zero()),
            rows,
            cols,
        }
    }

    /// Square identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |r, c| if r == c { T::one() } else { T::zero() })
    }

    /// Builds a matrix from a column-major coefficient slice.
    pub fn from_col_slice(rows: usize, cols: usize, data: &[T]) -> Self {
        assert!(
            data.len() == rows * cols,
            "coefficient slice length must match the matrix shape"
        );
        Self {
            data: AlignedBuffer::from_fn(rows * cols, |i| data[i]),
            rows,
            cols,
        }
    }

    /// Transposed (row-major) view of this matrix.
    #[inline(always)]
    pub fn transpose(&self) -> Transpose<'_, Self> {
        Transpose::new(self)
    }

    /// Sum of all coefficients.
    #[inline]
    pub fn sum(&self) -> T {
        crate::sum::sum(self)
    }

    /// Sum of the main-diagonal coefficients.
    #[inline]
    pub fn trace(&self) -> T {
        crate::sum::trace(self)
    }

    /// Scales every coefficient by `factor`.
    pub fn scale(&self, factor: T) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| self.coeff(r, c) * factor)
    }
}

impl<T: SimdScalar> Dense for DMatrix<T> {
    type Scalar = T;

    const ROWS: Option<usize> = None;
    const COLS: Option<usize> = None;
    const SIZE: Option<usize> = None;
    const ROW_MAJOR: bool = false;
    const PACKET_ACCESS: bool = <PacketOf<T> as Packet>::LANES > 1;
    const LINEAR_ACCESS: bool = true;
    const ALIGNED: bool = true;
    const COEFF_READ_COST: Option<usize> = Some(T::READ_COST);

    #[inline(always)]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    fn coeff(&self, row: usize, col: usize) -> T {
        self.data[col * self.rows + row]
    }

    #[inline(always)]
    fn coeff_linear(&self, index: usize) -> T {
        self.data[index]
    }

    #[inline(always)]
    unsafe fn packet<const ALIGNED_LOAD: bool>(&self, row: usize, col: usize) -> PacketOf<T> {
        self.packet_linear::<ALIGNED_LOAD>(col * self.rows + row)
    }

    #[inline(always)]
    unsafe fn packet_linear<const ALIGNED_LOAD: bool>(&self, index: usize) -> PacketOf<T> {
        debug_assert!(index + <PacketOf<T> as Packet>::LANES <= self.data.len());
        PacketOf::<T>::load(self.data.as_ptr().add(index), ALIGNED_LOAD)
    }
}

impl<T: SimdScalar> Index<(usize, usize)> for DMatrix<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[col * self.rows + row]
    }
}

impl<T: SimdScalar> Add for &DMatrix<T> {
    type Output = DMatrix<T>;

    fn add(self, rhs: Self) -> DMatrix<T> {
        assert!(
            self.rows == rhs.rows && self.cols == rhs.cols,
            "elementwise operands must have the same shape"
        );
        DMatrix::from_fn(self.rows, self.cols, |r, c| self.coeff(r, c) + rhs.coeff(r, c))
    }
}

impl<T: SimdScalar> Sub for &DMatrix<T> {
    type Output = DMatrix<T>;

    fn sub(self, rhs: Self) -> DMatrix<T> {
        assert!(
            self.rows == rhs.rows && self.cols == rhs.cols,
            "elementwise operands must have the same shape"
        );
        DMatrix::from_fn(self.rows, self.cols, |r, c| self.coeff(r, c) - rhs.coeff(r, c))
    }
}

/// Matrix product through the coefficient kernel.
impl<T: SimdScalar> Mul for &DMatrix<T> {
    type Output = DMatrix<T>;

    fn mul(self, rhs: Self) -> DMatrix<T> {
        let product: Product<'_, _, _> = Product::new(self, rhs);
        let mut out = DMatrix::zeros(self.rows, rhs.cols);
        unsafe { product.fill_col_major(out.data.as_mut_ptr()) };
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_matrix_layout_is_column_major() {
        let m = Matrix::<f32, 2, 3>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        // flat traversal walks down each column first
        assert_eq!(m.coeff_linear(0), 1.0);
        assert_eq!(m.coeff_linear(1), 4.0);
        assert_eq!(m.coeff_linear(2), 2.0);
    }

    #[test]
    fn fixed_matrix_storage_is_packet_aligned() {
        let m = Matrix::<f32, 4, 4>::identity();
        assert_eq!(m.as_ptr() as usize % PACKET_ALIGN, 0);
    }

    #[test]
    fn dynamic_matrix_layout_matches_fixed() {
        let fixed = Matrix::<f64, 3, 2>::from_fn(|r, c| (r * 10 + c) as f64);
        let dynamic = DMatrix::<f64>::from_fn(3, 2, |r, c| (r * 10 + c) as f64);

        for r in 0..3 {
            for c in 0..2 {
                assert_eq!(fixed[(r, c)], dynamic[(r, c)]);
            }
        }
    }

    #[test]
    fn transpose_view_swaps_indices() {
        let m = Matrix::<f32, 2, 3>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let t = m.transpose();

        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        assert_eq!(t.coeff(2, 1), m.coeff(1, 2));
    }

    #[test]
    fn elementwise_operators() {
        let a = Matrix::<f32, 2, 2>::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::<f32, 2, 2>::identity();

        assert_eq!((&a + &b)[(0, 0)], 2.0);
        assert_eq!((&a - &b)[(1, 1)], 3.0);
        assert_eq!(a.scale(2.0)[(1, 0)], 6.0);
        assert_eq!((-&a)[(0, 1)], -2.0);
    }

    #[test]
    #[should_panic(expected = "same shape")]
    fn mismatched_elementwise_shapes_panic() {
        let a = DMatrix::<f32>::zeros(2, 3);
        let b = DMatrix::<f32>::zeros(3, 2);
        let _ = &a + &b;
    }
}
