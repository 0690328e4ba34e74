//! Product-coefficient-kernel tests.
//!
//! Small fixed shapes go through the unrolled scalar kernel, transposed
//! operands force the inner-vectorized and row-major packet variants, and
//! dynamic shapes cover the runtime loops and the vector fast path. Every
//! case is checked against a naive triple-loop reference.

use num::complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lanekern::dense::Transpose;
use lanekern::simd::{Packet, PacketOf, SimdScalar};
use lanekern::{DMatrix, Dense, Matrix, Product};

/// Naive reference: `out[r][c] = sum_k lhs(r, k) * rhs(k, c)`.
fn reference_product<L, R>(lhs: &L, rhs: &R) -> Vec<Vec<L::Scalar>>
where
    L: Dense,
    R: Dense<Scalar = L::Scalar>,
{
    let mut out = vec![vec![num::Zero::zero(); rhs.cols()]; lhs.rows()];
    for (r, out_row) in out.iter_mut().enumerate() {
        for (c, slot) in out_row.iter_mut().enumerate() {
            let mut acc: L::Scalar = num::Zero::zero();
            for k in 0..lhs.cols() {
                acc = acc + lhs.coeff(r, k) * rhs.coeff(k, c);
            }
            *slot = acc;
        }
    }
    out
}

fn random_dmatrix(rows: usize, cols: usize, seed: u64) -> DMatrix<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    DMatrix::from_fn(rows, cols, |_, _| rng.random_range(-4.0..=4.0))
}

#[test]
fn worked_2x2_example() {
    let a = Matrix::<f32, 2, 2>::from_rows([[1.0, 2.0], [3.0, 4.0]]);
    let b = Matrix::<f32, 2, 2>::from_rows([[5.0, 6.0], [7.0, 8.0]]);

    let c = &a * &b;
    assert_eq!(c[(0, 0)], 19.0);
    assert_eq!(c[(0, 1)], 22.0);
    assert_eq!(c[(1, 0)], 43.0);
    assert_eq!(c[(1, 1)], 50.0);
}

#[test]
fn identity_is_neutral_on_both_sides() {
    let a = Matrix::<f32, 3, 3>::from_fn(|r, c| (r * 3 + c) as f32 - 4.0);
    let id = Matrix::<f32, 3, 3>::identity();

    assert_eq!(&a * &id, a);
    assert_eq!(&id * &a, a);

    let d = random_dmatrix(7, 7, 11);
    let did = DMatrix::<f32>::identity(7);
    let left = &did * &d;
    let right = &d * &did;
    for r in 0..7 {
        for c in 0..7 {
            assert_eq!(left[(r, c)], d[(r, c)]);
            assert_eq!(right[(r, c)], d[(r, c)]);
        }
    }
}

#[test]
fn product_is_associative_within_tolerance() {
    let a = Matrix::<f32, 2, 3>::from_fn(|r, c| (r + c) as f32 * 0.5 - 1.0);
    let b = Matrix::<f32, 3, 4>::from_fn(|r, c| (r * 4 + c) as f32 * 0.25);
    let c = Matrix::<f32, 4, 2>::from_fn(|r, c| (r * 2 + c) as f32 - 3.0);

    let left = &(&a * &b) * &c;
    let right = &a * &(&b * &c);

    for r in 0..2 {
        for col in 0..2 {
            assert!(
                (left[(r, col)] - right[(r, col)]).abs() < 1e-4,
                "associativity failed at ({r}, {col})"
            );
        }
    }
}

#[test]
fn fixed_product_matches_reference() {
    let a = Matrix::<f32, 4, 5>::from_fn(|r, c| ((r * 5 + c) % 7) as f32 - 3.0);
    let b = Matrix::<f32, 5, 3>::from_fn(|r, c| ((r * 3 + c) % 5) as f32 * 0.5);

    let got = &a * &b;
    let expected = reference_product(&a, &b);
    for r in 0..4 {
        for c in 0..3 {
            assert!((got[(r, c)] - expected[r][c]).abs() < 1e-4);
        }
    }
}

#[test]
fn dynamic_product_matches_reference() {
    let a = random_dmatrix(9, 14, 21);
    let b = random_dmatrix(14, 6, 22);

    let got = &a * &b;
    let expected = reference_product(&a, &b);
    for r in 0..9 {
        for c in 0..6 {
            assert!(
                (got[(r, c)] - expected[r][c]).abs() < 1e-2,
                "mismatch at ({r}, {c}): {} vs {}",
                got[(r, c)],
                expected[r][c]
            );
        }
    }
}

/// Row-major lhs against column-major rhs turns on inner vectorization;
/// an inner size of 5 leaves a scalar remainder after one packet.
#[test]
fn inner_vectorized_coefficients_match_reference() {
    let a_base = Matrix::<f32, 5, 3>::from_fn(|r, c| (r * 3 + c) as f32 * 0.5 - 2.0);
    let lhs = a_base.transpose(); // 3x5, row-major
    let rhs = Matrix::<f32, 5, 2>::from_fn(|r, c| ((r + c) % 4) as f32 - 1.0);

    let product: Product<_, _> = Product::new(&lhs, &rhs);
    let expected = reference_product(&lhs, &rhs);
    for r in 0..3 {
        for c in 0..2 {
            assert!(
                (product.coeff_at(r, c) - expected[r][c]).abs() < 1e-4,
                "mismatch at ({r}, {c})"
            );
        }
    }
}

/// Dynamic shapes with the same storage-order pairing delegate degenerate
/// vector cases to the dot kernel.
#[test]
fn dynamic_vector_cases_use_the_dot_fast_path() {
    let lhs_base = random_dmatrix(13, 1, 31); // 13x1 -> transpose is 1x13 row vector
    let lhs = lhs_base.transpose();
    let rhs = random_dmatrix(13, 1, 32); // column vector

    let product: Product<_, _> = Product::new(&lhs, &rhs);
    let expected = reference_product(&lhs, &rhs);
    assert!((product.coeff_at(0, 0) - expected[0][0]).abs() < 1e-3);

    // general dynamic operands with the vectorizable storage-order pairing
    let a_base = random_dmatrix(10, 4, 33);
    let a = a_base.transpose(); // 4x10 row-major
    let b = random_dmatrix(10, 5, 34);
    let p: Product<_, _> = Product::new(&a, &b);
    let reference = reference_product(&a, &b);
    for r in 0..4 {
        for c in 0..5 {
            assert!((p.coeff_at(r, c) - reference[r][c]).abs() < 1e-3);
        }
    }
}

/// The free `dot` entry point.
#[test]
fn dot_matches_scalar_accumulation() {
    let a = DMatrix::<f32>::from_fn(9, 1, |r, _| r as f32 * 0.5 - 2.0);
    let b = DMatrix::<f32>::from_fn(9, 1, |r, _| ((r * 3) % 5) as f32);

    let mut expected = 0.0f32;
    for r in 0..9 {
        expected += a[(r, 0)] * b[(r, 0)];
    }
    assert!((lanekern::dot(&a, &b) - expected).abs() < 1e-4);
}

#[test]
#[should_panic(expected = "vectors")]
fn dot_rejects_matrix_operands() {
    let a = DMatrix::<f32>::zeros(3, 2);
    let b = DMatrix::<f32>::zeros(3, 2);
    let _ = lanekern::dot(&a, &b);
}

/// The packet path produces exactly the coefficients the scalar path does,
/// in both evaluation orders.
#[test]
fn packet_path_agrees_with_coefficient_path() {
    fn packet_to_vec<T: SimdScalar>(p: PacketOf<T>) -> Vec<T> {
        let mut out = vec![num::Zero::zero(); PacketOf::<T>::LANES];
        unsafe { p.store_unaligned(out.as_mut_ptr()) };
        out
    }

    let lanes = PacketOf::<f32>::LANES;

    // column-major evaluation: lhs column-major, packets run down a column
    let a = Matrix::<f32, 8, 5>::from_fn(|r, c| ((r * 5 + c) % 9) as f32 - 4.0);
    let b = Matrix::<f32, 5, 3>::from_fn(|r, c| ((r + 2 * c) % 7) as f32 * 0.5);
    let col_major: Product<_, _> = Product::new(&a, &b);
    for col in 0..3 {
        for start in [0, lanes.min(8 - lanes)] {
            let got = packet_to_vec::<f32>(unsafe { col_major.packet_at::<false>(start, col) });
            for (lane, value) in got.iter().enumerate() {
                assert!(
                    (value - col_major.coeff_at(start + lane, col)).abs() < 1e-4,
                    "column-major packet lane {lane} diverges at ({start}, {col})"
                );
            }
        }
    }

    // row-major evaluation: both operands row-major, packets run along a row
    let a_base = Matrix::<f32, 5, 6>::from_fn(|r, c| ((r * 6 + c) % 8) as f32 - 3.0);
    let b_base = Matrix::<f32, 4, 5>::from_fn(|r, c| ((r * 5 + c) % 6) as f32 * 0.25);
    let lhs = a_base.transpose(); // 6x5 row-major
    let rhs = b_base.transpose(); // 5x4 row-major
    let row_major: Product<_, _> = Product::new(&lhs, &rhs);
    for row in 0..6 {
        let got = packet_to_vec::<f32>(unsafe { row_major.packet_at::<false>(row, 0) });
        for (lane, value) in got.iter().enumerate() {
            assert!(
                (value - row_major.coeff_at(row, lane)).abs() < 1e-4,
                "row-major packet lane {lane} diverges at ({row}, 0)"
            );
        }
    }
}

/// The four conjugation variants against scalar complex arithmetic.
#[test]
fn conjugation_variants_match_scalar_references() {
    let a = Matrix::<Complex<f32>, 3, 4>::from_fn(|r, c| {
        Complex::new((r + 1) as f32 * 0.5, (c as f32) - 1.5)
    });
    let b = Matrix::<Complex<f32>, 4, 2>::from_fn(|r, c| {
        Complex::new((c + 1) as f32, -((r + 1) as f32) * 0.25)
    });

    fn reference_conj(
        a: &Matrix<Complex<f32>, 3, 4>,
        b: &Matrix<Complex<f32>, 4, 2>,
        conj_lhs: bool,
        conj_rhs: bool,
        r: usize,
        c: usize,
    ) -> Complex<f32> {
        let mut acc = Complex::new(0.0, 0.0);
        for k in 0..4 {
            let l = if conj_lhs { a[(r, k)].conj() } else { a[(r, k)] };
            let x = if conj_rhs { b[(k, c)].conj() } else { b[(k, c)] };
            acc += l * x;
        }
        acc
    }

    let plain = Product::<_, _, false, false>::new(&a, &b);
    let conj_lhs = Product::<_, _, true, false>::new(&a, &b);
    let conj_rhs = Product::<_, _, false, true>::new(&a, &b);
    let conj_both = Product::<_, _, true, true>::new(&a, &b);

    for r in 0..3 {
        for c in 0..2 {
            let cases = [
                (plain.coeff_at(r, c), reference_conj(&a, &b, false, false, r, c)),
                (conj_lhs.coeff_at(r, c), reference_conj(&a, &b, true, false, r, c)),
                (conj_rhs.coeff_at(r, c), reference_conj(&a, &b, false, true, r, c)),
                (conj_both.coeff_at(r, c), reference_conj(&a, &b, true, true, r, c)),
            ];
            for (i, (got, expected)) in cases.iter().enumerate() {
                assert!(
                    (got - expected).norm() < 1e-4,
                    "variant {i} diverges at ({r}, {c}): {got} vs {expected}"
                );
            }
        }
    }
}

#[test]
fn complex_product_matches_reference() {
    let a = DMatrix::<Complex<f64>>::from_fn(4, 6, |r, c| {
        Complex::new(r as f64 - 1.5, c as f64 * 0.5)
    });
    let b = DMatrix::<Complex<f64>>::from_fn(6, 3, |r, c| {
        Complex::new((r + c) as f64 * 0.25, -(r as f64))
    });

    let got = &a * &b;
    let expected = reference_product(&a, &b);
    for r in 0..4 {
        for c in 0..3 {
            assert!((got[(r, c)] - expected[r][c]).norm() < 1e-9);
        }
    }
}

#[test]
#[should_panic(expected = "inner dimensions")]
fn mismatched_shapes_are_rejected_at_the_boundary() {
    let a = DMatrix::<f32>::zeros(2, 3);
    let b = DMatrix::<f32>::zeros(4, 2);
    let _: Product<_, _> = Product::new(&a, &b);
}

#[test]
#[should_panic(expected = "empty")]
fn empty_inner_dimension_is_a_contract_violation() {
    let a = DMatrix::<f32>::zeros(2, 0);
    let b = DMatrix::<f32>::zeros(0, 3);
    let _ = &a * &b;
}
