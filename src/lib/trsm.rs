use super::config::BlockingParams;
use super::gemm::gemm_kernel;
use super::matrix_math::dot;
use super::trmm::Triangle;
use super::view::{StridedView, StridedViewMut};

/* Substitution on a single diagonal block, B already scaled by alpha. Each
 * unknown is solved from unknowns solved before it. */
fn trsm_unblocked(b: &mut StridedViewMut, tri: StridedView, shape: Triangle) {
    let n = tri.rows();
    let trans = shape.trans;

    if !shape.right {
        /* op(A) X = B: lower forward, upper backward */
        for step in 0 .. n {
            let i = if shape.eff_lower() { step } else { n - 1 - step };
            let (from, to) = if shape.eff_lower() { (0, i) } else { (i + 1, n) };
            let diag = shape.diag(&tri, i);
            let arow = tri.op_row(i, trans).range(from, to);
            for j in 0 .. b.cols() {
                let sum = dot(&arow, &b.col(j).range(from, to));
                let val = (b.at(i, j) - sum) / diag;
                b.put(i, j, val);
            }
        }
    } else {
        /* X op(A) = B: upper left to right, lower right to left */
        for step in 0 .. n {
            let j = if shape.eff_lower() { n - 1 - step } else { step };
            let (from, to) = if shape.eff_lower() { (j + 1, n) } else { (0, j) };
            let diag = shape.diag(&tri, j);
            let acol = tri.op_col(j, trans).range(from, to);
            for i in 0 .. b.rows() {
                let sum = dot(&b.row(i).range(from, to), &acol);
                let val = (b.at(i, j) - sum) / diag;
                b.put(i, j, val);
            }
        }
    }
}

/// Solves `op(a)*X = alpha*b` (left) or `X*op(a) = alpha*b` (right) for `X`,
/// overwriting `b`. Each diagonal block of `col_block` is solved by
/// substitution and then eliminated from the unsolved part of `b` with a
/// GEMM update.
pub(crate) fn trsm_kernel(b: &mut StridedViewMut, a: StridedView, alpha: f64, shape: Triangle,
                          params: &BlockingParams) {
    let n = a.rows();
    debug_assert_eq!(a.cols(), n);
    if b.rows() == 0 || b.cols() == 0 {
        return;
    }
    b.scale(alpha);
    if alpha == 0.0 {
        return;
    }

    let nb = params.col_block();
    let trans = shape.trans;
    let mut starts: Vec<usize> = (0 .. n).step_by(nb).collect();
    /* Left upper and right lower are solved from the trailing block */
    if shape.eff_lower() == shape.right {
        starts.reverse();
    }

    for l0 in starts {
        let nl = nb.min(n - l0);
        let l1 = l0 + nl;
        let diag = a.sub(l0, l0, nl, nl);

        match (shape.right, shape.eff_lower()) {
            (false, true) => {
                let (mut top, mut bottom) = b.split_rows(l1);
                let cols = top.cols();
                trsm_unblocked(&mut top.sub_mut(l0, 0, nl, cols), diag, shape);
                gemm_kernel(&mut bottom, a.op_sub(trans, l1, l0, n - l1, nl),
                            top.view().sub(l0, 0, nl, cols), -1.0, 1.0, trans, false, params);
            }
            (false, false) => {
                let (mut top, mut bottom) = b.split_rows(l0);
                let cols = bottom.cols();
                trsm_unblocked(&mut bottom.sub_mut(0, 0, nl, cols), diag, shape);
                gemm_kernel(&mut top, a.op_sub(trans, 0, l0, l0, nl),
                            bottom.view().sub(0, 0, nl, cols), -1.0, 1.0, trans, false, params);
            }
            (true, false) => {
                let (mut left, mut right) = b.split_cols(l1);
                let rows = left.rows();
                trsm_unblocked(&mut left.sub_mut(0, l0, rows, nl), diag, shape);
                gemm_kernel(&mut right, left.view().sub(0, l0, rows, nl),
                            a.op_sub(trans, l0, l1, nl, n - l1), -1.0, 1.0, false, trans, params);
            }
            (true, true) => {
                let (mut left, mut right) = b.split_cols(l0);
                let rows = right.rows();
                trsm_unblocked(&mut right.sub_mut(0, 0, rows, nl), diag, shape);
                gemm_kernel(&mut left, right.view().sub(0, 0, rows, nl),
                            a.op_sub(trans, l0, 0, nl, l0), -1.0, 1.0, false, trans, params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::matrix::{Dense, Matrix};
    use super::super::trmm::trmm_kernel;

    #[test]
    fn undoes_trmm_for_every_shape() {
        let n = 11;
        for bits in 0 .. 16 {
            let shape = Triangle {
                lower: bits & 1 != 0,
                trans: bits & 2 != 0,
                unit: bits & 4 != 0,
                right: bits & 8 != 0,
            };
            for &nb in &[3, 4, 32] {
                let params = BlockingParams::uniform(nb).unwrap();
                /* Diagonally dominant so the solve is well conditioned */
                let a = Matrix::from_fn(n, n, |i, j| if i == j { 4.0 + i as f64 } else { 0.25 / (1 + i + j) as f64 });
                let x = if shape.right { Matrix::random(5, n, -1.0, 1.0) } else { Matrix::random(n, 5, -1.0, 1.0) };
                let mut b = x.clone();
                trmm_kernel(&mut b.strided_mut().unwrap(), a.strided().unwrap(), 2.0, shape, &params);
                trsm_kernel(&mut b.strided_mut().unwrap(), a.strided().unwrap(), 0.5, shape, &params);
                assert!(b.max_rel_diff(&x) < 1e-12, "{:?} nb {}", shape, nb);
            }
        }
    }

    #[test]
    fn zero_alpha_clears_b() {
        let a = Matrix::with_value(3, 3, std::f64::NAN);
        let mut b = Matrix::with_value(3, 2, std::f64::NAN);
        let shape = Triangle { lower: false, trans: false, unit: false, right: false };
        trsm_kernel(&mut b.strided_mut().unwrap(), a.strided().unwrap(), 0.0, shape,
                    &BlockingParams::default());
        assert_eq!(b, Matrix::zeros(3, 2));
    }
}
