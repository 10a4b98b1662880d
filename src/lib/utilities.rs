use rand::distributions::{Distribution, Uniform};
use rand::distributions::uniform::SampleUniform;
use super::flags::Flags;
use super::matrix::{Dense, Matrix};

/// Column-major index of element (row, col) with leading dimension `ld`.
#[inline(always)]
pub fn get_idx(row: usize, col: usize, ld: usize) -> usize {
    row + col * ld
}

pub fn random_array<T>(cols: usize, rows: usize, low: T, high: T) -> Vec<T>
    where T: SampleUniform
{
    assert!(rows == 0 || usize::MAX / rows > cols);

    let interval = Uniform::from(low .. high);
    let mut rng = rand::thread_rng();
    let mut arr = Vec::with_capacity(rows * cols);

    for _ in 0 .. rows * cols {
        arr.push(interval.sample(&mut rng))
    }

    arr
}

/// Relative comparison, `|a - b| <= tol * max(1, |a|, |b|)`.
pub fn float_eq(a: f64, b: f64, tol: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = 1f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= tol * scale
}

pub fn test_equality(rows: usize, cols: usize, c: &Matrix, correct: &Matrix) {
    assert_eq!((c.rows(), c.cols()), (rows, cols));
    assert_eq!((correct.rows(), correct.cols()), (rows, cols));
    for col in 0 .. cols {
        for row in 0 .. rows {
            assert!(float_eq(c.get(row, col), correct.get(row, col), 1e-9),
                    "({}, {}): {} != {}", row, col, c.get(row, col), correct.get(row, col));
        }
    }
}

fn op_get(m: &Matrix, row: usize, col: usize, trans: bool) -> f64 {
    if trans { m.get(col, row) } else { m.get(row, col) }
}

/* Reference kernels: textbook triple loops over fully expanded matrices.
 * They are what the blocked kernels are checked against. */

/// `C = beta*C + alpha*op(A)*op(B)`.
pub fn naive_gemm(c: &mut Matrix, a: &Matrix, b: &Matrix, alpha: f64, beta: f64, flags: Flags) {
    let p = if flags.trans_a() { a.rows() } else { a.cols() };
    for col in 0 .. c.cols() {
        for row in 0 .. c.rows() {
            let mut sum = 0.0;
            for k in 0 .. p {
                sum += op_get(a, row, k, flags.trans_a()) * op_get(b, k, col, flags.trans_b());
            }
            let old = if beta == 0.0 { 0.0 } else { beta * c.get(row, col) };
            c.set(row, col, old + alpha * sum);
        }
    }
}

/// Full symmetric matrix from the UPPER or LOWER triangle of `a`.
pub fn mirror_triangle(a: &Matrix, lower: bool) -> Matrix {
    Matrix::from_fn(a.rows(), a.cols(), |row, col| {
        let stored = if lower { row >= col } else { row <= col };
        if stored { a.get(row, col) } else { a.get(col, row) }
    })
}

/// Full triangular matrix from the UPPER or LOWER triangle of `a`, zeros
/// elsewhere and ones on the diagonal when `unit`.
pub fn expand_triangle(a: &Matrix, lower: bool, unit: bool) -> Matrix {
    Matrix::from_fn(a.rows(), a.cols(), |row, col| {
        if row == col && unit {
            1.0
        } else if (lower && row >= col) || (!lower && row <= col) {
            a.get(row, col)
        } else {
            0.0
        }
    })
}

/// `B = alpha*op(T)*B` or `B = alpha*B*op(T)` with dense products.
pub fn naive_trmm(b: &mut Matrix, a: &Matrix, alpha: f64, flags: Flags) {
    let tri = expand_triangle(a, flags.lower(), flags.unit());
    let orig = b.clone();
    if flags.right() {
        let tflags = if flags.trans_a() { super::flags::TRANSB } else { super::flags::NONE };
        naive_gemm(b, &orig, &tri, alpha, 0.0, tflags);
    } else {
        let tflags = if flags.trans_a() { super::flags::TRANSA } else { super::flags::NONE };
        naive_gemm(b, &tri, &orig, alpha, 0.0, tflags);
    }
}

/// `C = beta*C + alpha*op(A)*op(A)^T` on the selected triangle only.
pub fn naive_syrk(c: &mut Matrix, a: &Matrix, alpha: f64, beta: f64, flags: Flags) {
    let n = c.rows();
    let trans = flags.trans_a();
    let p = if trans { a.rows() } else { a.cols() };
    for col in 0 .. n {
        for row in 0 .. n {
            if (flags.lower() && row < col) || (!flags.lower() && row > col) {
                continue;
            }
            let mut sum = 0.0;
            for k in 0 .. p {
                sum += op_get(a, row, k, trans) * op_get(a, col, k, trans);
            }
            let old = if beta == 0.0 { 0.0 } else { beta * c.get(row, col) };
            c.set(row, col, old + alpha * sum);
        }
    }
}

/// `C = beta*C + alpha*(op(A)*op(B)^T + op(B)*op(A)^T)` on the selected triangle only.
pub fn naive_syr2k(c: &mut Matrix, a: &Matrix, b: &Matrix, alpha: f64, beta: f64, flags: Flags) {
    let n = c.rows();
    let trans = flags.trans_a();
    let p = if trans { a.rows() } else { a.cols() };
    for col in 0 .. n {
        for row in 0 .. n {
            if (flags.lower() && row < col) || (!flags.lower() && row > col) {
                continue;
            }
            let mut sum = 0.0;
            for k in 0 .. p {
                sum += op_get(a, row, k, trans) * op_get(b, col, k, trans);
                sum += op_get(b, row, k, trans) * op_get(a, col, k, trans);
            }
            let old = if beta == 0.0 { 0.0 } else { beta * c.get(row, col) };
            c.set(row, col, old + alpha * sum);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_eq_is_relative() {
        assert!(float_eq(1e12, 1e12 + 1.0, 1e-9));
        assert!(!float_eq(1.0, 1.0 + 1e-6, 1e-9));
        assert!(float_eq(0.0, 1e-12, 1e-9));
    }

    #[test]
    fn random_array_in_range() {
        let arr = random_array(7, 3, -2.0, 2.0);
        assert_eq!(arr.len(), 21);
        assert!(arr.iter().all(|x| *x >= -2.0 && *x < 2.0));
    }

    #[test]
    fn naive_gemm_small() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = Matrix::from_rows(&[&[5.0, 6.0], &[7.0, 8.0]]);
        let mut c = Matrix::with_value(2, 2, 1.0);
        naive_gemm(&mut c, &a, &b, 1.0, 2.0, super::super::flags::NONE);
        assert_eq!(c, Matrix::from_rows(&[&[21.0, 24.0], &[45.0, 52.0]]));
    }
}
