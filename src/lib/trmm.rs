use super::config::BlockingParams;
use super::gemm::gemm_kernel;
use super::matrix_math::dot;
use super::view::{StridedView, StridedViewMut};

/// Shape of a triangular operand as the kernels see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Triangle {
    /// Lower triangle stored.
    pub lower: bool,
    /// Apply the transpose of the stored matrix.
    pub trans: bool,
    /// Diagonal is implicitly one and never read.
    pub unit: bool,
    /// Operand on the right of B.
    pub right: bool,
}

impl Triangle {
    /// Whether `op(A)` is lower triangular.
    #[inline(always)]
    pub fn eff_lower(&self) -> bool {
        self.lower != self.trans
    }

    #[inline(always)]
    pub(crate) fn diag(&self, tri: &StridedView, idx: usize) -> f64 {
        if self.unit { 1.0 } else { tri.at(idx, idx) }
    }
}

/* In place multiply by a single diagonal block. Every element is rewritten
 * from elements of B that have not been rewritten yet. */
fn trmm_unblocked(b: &mut StridedViewMut, tri: StridedView, alpha: f64, shape: Triangle) {
    let n = tri.rows();
    let trans = shape.trans;

    if !shape.right {
        for step in 0 .. n {
            let i = if shape.eff_lower() { n - 1 - step } else { step };
            let (from, to) = if shape.eff_lower() { (0, i) } else { (i + 1, n) };
            let diag = shape.diag(&tri, i);
            let arow = tri.op_row(i, trans).range(from, to);
            for j in 0 .. b.cols() {
                let sum = dot(&arow, &b.col(j).range(from, to));
                let val = alpha * (diag * b.at(i, j) + sum);
                b.put(i, j, val);
            }
        }
    } else {
        for step in 0 .. n {
            let j = if shape.eff_lower() { step } else { n - 1 - step };
            let (from, to) = if shape.eff_lower() { (j + 1, n) } else { (0, j) };
            let diag = shape.diag(&tri, j);
            let acol = tri.op_col(j, trans).range(from, to);
            for i in 0 .. b.rows() {
                let sum = dot(&b.row(i).range(from, to), &acol);
                let val = alpha * (diag * b.at(i, j) + sum);
                b.put(i, j, val);
            }
        }
    }
}

/// `b = alpha*op(a)*b` (left) or `b = alpha*b*op(a)` (right) in place, `a`
/// triangular. Diagonal blocks of `col_block` are multiplied in place, the
/// off-diagonal contribution is added with the GEMM kernel from the part of
/// `b` that is still unmodified.
pub(crate) fn trmm_kernel(b: &mut StridedViewMut, a: StridedView, alpha: f64, shape: Triangle,
                          params: &BlockingParams) {
    let n = a.rows();
    debug_assert_eq!(a.cols(), n);
    if b.rows() == 0 || b.cols() == 0 {
        return;
    }
    if alpha == 0.0 {
        b.scale(0.0);
        return;
    }

    let nb = params.col_block();
    let trans = shape.trans;
    let mut starts: Vec<usize> = (0 .. n).step_by(nb).collect();
    /* Left lower and right upper rewrite the trailing blocks first */
    if shape.eff_lower() != shape.right {
        starts.reverse();
    }

    for l0 in starts {
        let nl = nb.min(n - l0);
        let l1 = l0 + nl;
        let diag = a.sub(l0, l0, nl, nl);

        match (shape.right, shape.eff_lower()) {
            (false, true) => {
                let (top, mut rest) = b.split_rows(l0);
                let mut blk = rest.sub_mut(0, 0, nl, top.cols());
                trmm_unblocked(&mut blk, diag, alpha, shape);
                gemm_kernel(&mut blk, a.op_sub(trans, l0, 0, nl, l0), top.view(),
                            alpha, 1.0, trans, false, params);
            }
            (false, false) => {
                let (mut top, bottom) = b.split_rows(l1);
                let cols = top.cols();
                let mut blk = top.sub_mut(l0, 0, nl, cols);
                trmm_unblocked(&mut blk, diag, alpha, shape);
                gemm_kernel(&mut blk, a.op_sub(trans, l0, l1, nl, n - l1), bottom.view(),
                            alpha, 1.0, trans, false, params);
            }
            (true, true) => {
                let (mut left, right) = b.split_cols(l1);
                let rows = left.rows();
                let mut blk = left.sub_mut(0, l0, rows, nl);
                trmm_unblocked(&mut blk, diag, alpha, shape);
                gemm_kernel(&mut blk, right.view(), a.op_sub(trans, l1, l0, n - l1, nl),
                            alpha, 1.0, false, trans, params);
            }
            (true, false) => {
                let (left, mut right) = b.split_cols(l0);
                let rows = right.rows();
                let mut blk = right.sub_mut(0, 0, rows, nl);
                trmm_unblocked(&mut blk, diag, alpha, shape);
                gemm_kernel(&mut blk, left.view(), a.op_sub(trans, 0, l0, l0, nl),
                            alpha, 1.0, false, trans, params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::flags::{Flags, LOWER, NONE, RIGHT, TRANS, UNIT};
    use super::super::matrix::{Dense, Matrix};
    use super::super::utilities::{naive_trmm, test_equality};

    fn flags_of(shape: Triangle) -> Flags {
        let mut flags = NONE;
        if shape.lower { flags |= LOWER; }
        if shape.trans { flags |= TRANS; }
        if shape.unit { flags |= UNIT; }
        if shape.right { flags |= RIGHT; }
        flags
    }

    fn shapes() -> Vec<Triangle> {
        let mut all = Vec::new();
        for bits in 0 .. 16 {
            all.push(Triangle {
                lower: bits & 1 != 0,
                trans: bits & 2 != 0,
                unit: bits & 4 != 0,
                right: bits & 8 != 0,
            });
        }
        all
    }

    #[test]
    fn blocked_matches_dense() {
        let n = 13;
        for shape in shapes() {
            for &nb in &[2, 5, 64] {
                let params = BlockingParams::uniform(nb).unwrap();
                let a = Matrix::random(n, n, 0.5, 1.5);
                let mut b = if shape.right { Matrix::random(7, n, -1.0, 1.0) } else { Matrix::random(n, 7, -1.0, 1.0) };
                let mut expect = b.clone();
                naive_trmm(&mut expect, &a, 0.5, flags_of(shape));
                trmm_kernel(&mut b.strided_mut().unwrap(), a.strided().unwrap(), 0.5, shape, &params);
                test_equality(expect.rows(), expect.cols(), &b, &expect);
            }
        }
    }

    #[test]
    fn unit_diagonal_is_not_read() {
        let mut a = Matrix::random(6, 6, 0.5, 1.5);
        for i in 0 .. 6 {
            a.set(i, i, std::f64::NAN);
        }
        let mut b = Matrix::random(6, 3, -1.0, 1.0);
        let shape = Triangle { lower: true, trans: false, unit: true, right: false };
        trmm_kernel(&mut b.strided_mut().unwrap(), a.strided().unwrap(), 1.0, shape,
                    &BlockingParams::uniform(4).unwrap());
        assert!(b.as_slice().iter().all(|x| x.is_finite()));
    }
}
