use super::config::BlockingParams;
use super::gemm::write_back;
use super::matrix_math::{dot, dot4};
use super::scheduler::BlockTask;
use super::view::{Lane, StridedView, StridedViewMut};

/* Row `idx` of a symmetric matrix of which only one triangle is stored is
 * read in two pieces split at the diagonal: one piece is a run of row `idx`,
 * the other a run of column `idx`, both inside the stored triangle. The
 * unstored triangle is never dereferenced. */

/// The stored pieces of symmetric row `idx` over `[k0, k1)`, each with the
/// contraction range it covers. Either piece may be empty.
pub(crate) fn sym_pieces<'a>(a: &StridedView<'a>, idx: usize, k0: usize, k1: usize,
                             lower: bool) -> [(Lane<'a>, usize, usize); 2] {
    /* upper: A(k, idx) for k < idx, A(idx, k) for k >= idx
     * lower: A(idx, k) for k <= idx, A(k, idx) for k > idx */
    let split = if lower { idx + 1 } else { idx };
    let lo_end = k1.min(split).max(k0);
    let hi_start = k0.max(split).min(k1);
    let (before, after) = if lower {
        (a.row(idx), a.col(idx))
    } else {
        (a.col(idx), a.row(idx))
    };
    [(before.range(k0, lo_end), k0, lo_end), (after.range(hi_start, k1), hi_start, k1)]
}

/// `acc[base + q*stride] += x . other(q)[ks..ke]` for `q` in `0 .. count`.
#[inline]
fn accumulate_lane<'a, F>(acc: &mut [f64], base: usize, stride: usize, count: usize,
                          x: &Lane, ks: usize, ke: usize, other: F)
    where F: Fn(usize) -> Lane<'a>
{
    let count4 = count - count % 4;
    for q in (0 .. count4).step_by(4) {
        let ys = [other(q).range(ks, ke), other(q + 1).range(ks, ke),
                  other(q + 2).range(ks, ke), other(q + 3).range(ks, ke)];
        let sums = dot4(x, &ys);
        for r in 0 .. 4 {
            acc[base + (q + r) * stride] += sums[r];
        }
    }
    for q in count4 .. count {
        acc[base + q * stride] += dot(x, &other(q).range(ks, ke));
    }
}

/// `c = beta*c + alpha*A*op(b)` (left) or `c = beta*c + alpha*op(b)*A`
/// (right) on the rectangle `task`, `A` symmetric with only its `lower` or
/// upper triangle stored in `a`.
pub(crate) fn symm_blocked(c: &mut StridedViewMut, a: StridedView, b: StridedView,
                           alpha: f64, beta: f64, lower: bool, right: bool, trans_b: bool,
                           task: &BlockTask, params: &BlockingParams) {
    let (m, n) = (c.rows(), c.cols());
    let kdim = a.rows();
    debug_assert_eq!(a.cols(), kdim);

    if m == 0 || n == 0 {
        return;
    }
    if alpha == 0.0 || kdim == 0 {
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
            let (row0, col0) = (task.row_start + i0, task.col_start + j0);

            for k0 in (0 .. kdim).step_by(kb) {
                let k1 = kdim.min(k0 + kb);
                if !right {
                    for i in 0 .. ni {
                        for (x, ks, ke) in sym_pieces(&a, row0 + i, k0, k1, lower).iter() {
                            if x.is_empty() {
                                continue;
                            }
                            accumulate_lane(block, i, ni, nj, x, *ks, *ke,
                                            |j| b.op_col(col0 + j, trans_b));
                        }
                    }
                } else {
                    for j in 0 .. nj {
                        for (x, ks, ke) in sym_pieces(&a, col0 + j, k0, k1, lower).iter() {
                            if x.is_empty() {
                                continue;
                            }
                            accumulate_lane(block, j * ni, 1, ni, x, *ks, *ke,
                                            |i| b.op_row(row0 + i, trans_b));
                        }
                    }
                }
            }

            write_back(&mut c.sub_mut(i0, j0, ni, nj), block, alpha, beta);
        }
    }
}
