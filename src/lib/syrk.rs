use super::config::BlockingParams;
use super::gemm::gemm_kernel;
use super::matrix_math::dot;
use super::scheduler::BlockTask;
use super::view::{StridedView, StridedViewMut};

/// Operands of a symmetric rank update: `op(a)*op(a)^T`, or the rank-2k
/// sum `op(a)*op(b)^T + op(b)*op(a)^T` when `b` is present.
#[derive(Clone, Copy)]
pub(crate) struct RankOperands<'a> {
    pub a: StridedView<'a>,
    pub b: Option<StridedView<'a>>,
    pub trans: bool,
}

impl<'a> RankOperands<'a> {
    /// Contraction length, the columns of `op(a)`.
    fn depth(&self) -> usize {
        self.a.op_dims(self.trans).1
    }

    /// Rows `[row, row + rows)` of `op(x)`, as the view whose `op` they are.
    fn rows_of(&self, x: &StridedView<'a>, row: usize, rows: usize) -> StridedView<'a> {
        x.op_sub(self.trans, row, 0, rows, self.depth())
    }

    /// Element `(i, j)` of the full update, before alpha.
    fn entry(&self, i: usize, j: usize) -> f64 {
        let trans = self.trans;
        let (ai, aj) = (self.a.op_row(i, trans), self.a.op_row(j, trans));
        match self.b {
            None => dot(&ai, &aj),
            Some(b) => dot(&ai, &b.op_row(j, trans)) + dot(&b.op_row(i, trans), &aj),
        }
    }
}

#[inline(always)]
fn in_triangle(row: usize, col: usize, lower: bool) -> bool {
    if lower { row >= col } else { row <= col }
}

/* Diagonal block: rows and columns [j0, j0 + nj) of C, local columns start
 * at `lc`. Only the selected triangle is read or written. */
fn rank_update_diag(c: &mut StridedViewMut, ops: &RankOperands, j0: usize, nj: usize, lc: usize,
                    alpha: f64, beta: f64, lower: bool) {
    for j in j0 .. j0 + nj {
        let (from, to) = if lower { (j, j0 + nj) } else { (j0, j + 1) };
        for i in from .. to {
            debug_assert!(in_triangle(i, j, lower));
            let old = if beta == 0.0 { 0.0 } else { beta * c.at(i, lc + j - j0) };
            let val = old + alpha * ops.entry(i, j);
            c.put(i, lc + j - j0, val);
        }
    }
}

fn scale_triangle(c: &mut StridedViewMut, task: &BlockTask, beta: f64, lower: bool) {
    for lc in 0 .. c.cols() {
        let j = task.col_start + lc;
        let (from, to) = if lower { (j, c.rows()) } else { (0, j + 1) };
        for i in from .. to.min(c.rows()) {
            let val = if beta == 0.0 { 0.0 } else { beta * c.at(i, lc) };
            c.put(i, lc, val);
        }
    }
}

/// Rank-k or rank-2k update of the `lower` or upper triangle of the
/// columns `[task.col_start, task.col_end)` of C; `c` holds all rows of those
/// columns. Diagonal blocks of `col_block` are updated element by element,
/// the blocks off the diagonal with the GEMM kernel.
pub(crate) fn rank_update_blocked(c: &mut StridedViewMut, ops: RankOperands, alpha: f64,
                                  beta: f64, lower: bool, task: &BlockTask,
                                  params: &BlockingParams) {
    let n = c.rows();
    debug_assert_eq!(task.rows(), n);
    if n == 0 || c.cols() == 0 {
        return;
    }
    let k = ops.depth();
    if alpha == 0.0 || k == 0 {
        scale_triangle(c, task, beta, lower);
        return;
    }

    let trans = ops.trans;
    let nb = params.col_block();
    for j0 in (task.col_start .. task.col_end).step_by(nb) {
        let nj = nb.min(task.col_end - j0);
        let lc = j0 - task.col_start;

        rank_update_diag(c, &ops, j0, nj, lc, alpha, beta, lower);

        /* Rows strictly above (upper) or below (lower) the diagonal block */
        let (r0, nr) = if lower { (j0 + nj, n - j0 - nj) } else { (0, j0) };
        if nr == 0 {
            continue;
        }
        let mut off = c.sub_mut(r0, lc, nr, nj);
        let a_rows = ops.rows_of(&ops.a, r0, nr);
        let a_cols = ops.rows_of(&ops.a, j0, nj);
        match ops.b {
            None => {
                gemm_kernel(&mut off, a_rows, a_cols, alpha, beta, trans, !trans, params);
            }
            Some(b) => {
                let b_rows = ops.rows_of(&b, r0, nr);
                let b_cols = ops.rows_of(&b, j0, nj);
                gemm_kernel(&mut off, a_rows, b_cols, alpha, beta, trans, !trans, params);
                gemm_kernel(&mut off, b_rows, a_cols, alpha, 1.0, trans, !trans, params);
            }
        }
    }
}
