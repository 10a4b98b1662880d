use super::config::BlockingParams;
use super::matrix_math::{dot, dot4};
use super::scheduler::BlockTask;
use super::view::{Lane, StridedView, StridedViewMut};

/// Adds `row_lane(i) . col_lane(j)` to `acc[i + j*ni]` for the whole
/// `ni x nj` block, four columns per pass.
#[inline]
pub(crate) fn accumulate<'a, R, C>(acc: &mut [f64], ni: usize, nj: usize, row_lane: R, col_lane: C)
    where R: Fn(usize) -> Lane<'a>,
          C: Fn(usize) -> Lane<'a>
{
    let nj4 = nj - nj % 4;
    for i in 0 .. ni {
        let x = row_lane(i);
        if x.is_empty() {
            continue;
        }
        for j in (0 .. nj4).step_by(4) {
            let ys = [col_lane(j), col_lane(j + 1), col_lane(j + 2), col_lane(j + 3)];
            let sums = dot4(&x, &ys);
            for q in 0 .. 4 {
                acc[i + (j + q) * ni] += sums[q];
            }
        }
        for j in nj4 .. nj {
            acc[i + j * ni] += dot(&x, &col_lane(j));
        }
    }
}

/// `c = beta*c + alpha*acc`, where `acc` holds the block column-major with
/// leading dimension `c.rows()`. With `beta == 0` the old contents of `c` are
/// not read.
pub(crate) fn write_back(c: &mut StridedViewMut, acc: &[f64], alpha: f64, beta: f64) {
    let ni = c.rows();
    for j in 0 .. c.cols() {
        for i in 0 .. ni {
            let old = if beta == 0.0 { 0.0 } else { beta * c.at(i, j) };
            c.put(i, j, old + alpha * acc[i + j * ni]);
        }
    }
}

/// `c = beta*c + alpha*op(a)*op(b)` over the whole of `c`, blocked by
/// `params`. `op(a)` must be `rows(c) x p` and `op(b)` `p x cols(c)`.
pub(crate) fn gemm_kernel(c: &mut StridedViewMut, a: StridedView, b: StridedView,
                          alpha: f64, beta: f64, trans_a: bool, trans_b: bool,
                          params: &BlockingParams) {
    let (m, n) = (c.rows(), c.cols());
    let (a_rows, p) = a.op_dims(trans_a);
    debug_assert_eq!(a_rows, m);
    debug_assert_eq!(b.op_dims(trans_b), (p, n));

    if m == 0 || n == 0 {
        return;
    }
    if alpha == 0.0 || p == 0 {
        c.scale(beta);
        return;
    }

    let (mb, nb, kb) = (params.row_block(), params.col_block(), params.panel_len());
    let mut acc = vec![0.0; mb.min(m) * nb.min(n)];

    for j0 in (0 .. n).step_by(nb) {
        let nj = nb.min(n - j0);
        for i0 in (0 .. m).step_by(mb) {
            let ni = mb.min(m - i0);
            let block = &mut acc[.. ni * nj];
            block.iter_mut().for_each(|x| *x = 0.0);

            for k0 in (0 .. p).step_by(kb) {
                let k1 = p.min(k0 + kb);
                accumulate(block, ni, nj,
                           |i| a.op_row(i0 + i, trans_a).range(k0, k1),
                           |j| b.op_col(j0 + j, trans_b).range(k0, k1));
            }

            write_back(&mut c.sub_mut(i0, j0, ni, nj), block, alpha, beta);
        }
    }
}

/// GEMM restricted to the rectangle `task` of the full output; `c` is the
/// already cut out rectangle.
pub(crate) fn gemm_blocked(c: &mut StridedViewMut, a: StridedView, b: StridedView,
                           alpha: f64, beta: f64, trans_a: bool, trans_b: bool,
                           task: &BlockTask, params: &BlockingParams) {
    let p = a.op_dims(trans_a).1;
    let a_part = a.op_sub(trans_a, task.row_start, 0, task.rows(), p);
    let b_part = b.op_sub(trans_b, 0, task.col_start, p, task.cols());
    gemm_kernel(c, a_part, b_part, alpha, beta, trans_a, trans_b, params);
}
