//! Blocked BLAS level 3 kernels over column-major `f64` matrices: GEMM,
//! SYMM, TRMM, TRSM, SYRK and SYR2K, run either on the calling thread or
//! split into disjoint output rectangles over a rayon pool.

mod config;
mod danger_math;
mod error;
pub mod flags;
mod gemm;
mod matrix;
mod matrix_math;
pub mod scheduler;
mod symm;
mod syrk;
mod trmm;
mod trsm;
mod utilities;
mod view;

pub use config::{BlockingParams, Context, default_workers, num_workers, set_blocking_params};
pub use config::{DEFAULT_COL_BLOCK, DEFAULT_PANEL_LEN, DEFAULT_ROW_BLOCK, PARALLEL_THRESHOLD};
pub use error::{Error, Result};
pub use flags::Flags;
pub use matrix::{Dense, Matrix};
pub use matrix_math::{dot, dot4, FMADD};
pub use utilities::{get_idx, random_array, float_eq, test_equality};
pub use utilities::{naive_gemm, naive_syrk, naive_syr2k, naive_trmm};
pub use utilities::{expand_triangle, mirror_triangle};
pub use view::{Lane, StridedView, StridedViewMut};

use config::global_context;
use scheduler::{ALIGN, BlockTask, divide_work, partition, run_tasks, stripes};
use syrk::RankOperands;
use trmm::Triangle;

fn shape_of(rows: usize, cols: usize) -> String {
    format!("{}x{}", rows, cols)
}

fn triangle_of(flags: Flags) -> Triangle {
    Triangle {
        lower: flags.lower(),
        trans: flags.trans_a(),
        unit: flags.unit(),
        right: flags.right(),
    }
}

impl Context {
    /// `C = beta*C + alpha*op(A)*op(B)`, `op` selected by `TRANSA` and
    /// `TRANSB`.
    pub fn mult(&self, c: &mut impl Dense, a: &impl Dense, b: &impl Dense,
                alpha: f64, beta: f64, flags: Flags) -> Result<()> {
        let (trans_a, trans_b) = (flags.trans_a(), flags.trans_b());
        let (av, bv) = (a.strided()?, b.strided()?);
        let (m, p) = av.op_dims(trans_a);
        let (pb, n) = bv.op_dims(trans_b);
        if p != pb {
            return Err(Error::mismatch("mult", format!("{} rows in op(B)", p),
                                       format!("{} rows", pb)));
        }
        if (c.rows(), c.cols()) != (m, n) {
            return Err(Error::mismatch("mult", format!("C of {}", shape_of(m, n)),
                                       shape_of(c.rows(), c.cols())));
        }

        let mut cv = c.strided_mut()?;
        let params = *self.params();
        match self.pool_for(m.saturating_mul(n).saturating_mul(p)) {
            None => {
                log::debug!("mult {}x{}x{} {:?} on caller", m, n, p, flags);
                gemm::gemm_kernel(&mut cv, av, bv, alpha, beta, trans_a, trans_b, &params);
            }
            Some(pool) => {
                let (col_workers, row_workers) = divide_work(m, n, self.workers());
                log::debug!("mult {}x{}x{} {:?} on {}x{} grid", m, n, p, flags,
                            col_workers, row_workers);
                let tasks = partition(m, n, col_workers, row_workers, ALIGN);
                run_tasks(pool, &mut cv, &tasks, |rect, task| {
                    gemm::gemm_blocked(rect, av, bv, alpha, beta, trans_a, trans_b, task, &params)
                });
            }
        }
        Ok(())
    }

    /// `C = beta*C + alpha*A*op(B)` (LEFT) or `C = beta*C + alpha*op(B)*A`
    /// (RIGHT) for symmetric `A`, of which only the `LOWER` or `UPPER`
    /// (default) triangle is read.
    pub fn mult_sym(&self, c: &mut impl Dense, a: &impl Dense, b: &impl Dense,
                    alpha: f64, beta: f64, flags: Flags) -> Result<()> {
        let (lower, right, trans_b) = (flags.lower(), flags.right(), flags.trans_b());
        let (av, bv) = (a.strided()?, b.strided()?);
        let kdim = av.rows();
        if av.cols() != kdim {
            return Err(Error::mismatch("mult_sym", "square A", shape_of(av.rows(), av.cols())));
        }
        let (b_rows, b_cols) = bv.op_dims(trans_b);
        if right && b_cols != kdim {
            return Err(Error::mismatch("mult_sym", format!("{} columns in op(B)", kdim),
                                       format!("{} columns", b_cols)));
        }
        if !right && b_rows != kdim {
            return Err(Error::mismatch("mult_sym", format!("{} rows in op(B)", kdim),
                                       format!("{} rows", b_rows)));
        }
        let (m, n) = (b_rows, b_cols);
        if (c.rows(), c.cols()) != (m, n) {
            return Err(Error::mismatch("mult_sym", format!("C of {}", shape_of(m, n)),
                                       shape_of(c.rows(), c.cols())));
        }

        let mut cv = c.strided_mut()?;
        let params = *self.params();
        match self.pool_for(m.saturating_mul(n).saturating_mul(kdim)) {
            None => {
                log::debug!("mult_sym {}x{} by {} {:?} on caller", m, n, kdim, flags);
                symm::symm_blocked(&mut cv, av, bv, alpha, beta, lower, right, trans_b,
                                   &BlockTask::full(m, n), &params);
            }
            Some(pool) => {
                let (col_workers, row_workers) = divide_work(m, n, self.workers());
                log::debug!("mult_sym {}x{} by {} {:?} on {}x{} grid", m, n, kdim, flags,
                            col_workers, row_workers);
                let tasks = partition(m, n, col_workers, row_workers, ALIGN);
                run_tasks(pool, &mut cv, &tasks, |rect, task| {
                    symm::symm_blocked(rect, av, bv, alpha, beta, lower, right, trans_b, task,
                                       &params)
                });
            }
        }
        Ok(())
    }

    fn check_triangular(op: &'static str, a: &StridedView, b: &StridedViewMut, right: bool)
                        -> Result<()> {
        let n = a.rows();
        if a.cols() != n {
            return Err(Error::mismatch(op, "square A", shape_of(a.rows(), a.cols())));
        }
        if right && b.cols() != n {
            return Err(Error::mismatch(op, format!("{} columns in B", n),
                                       format!("{} columns", b.cols())));
        }
        if !right && b.rows() != n {
            return Err(Error::mismatch(op, format!("{} rows in B", n),
                                       format!("{} rows", b.rows())));
        }
        Ok(())
    }

    /* TRMM and TRSM only couple the rows of B (left) or its columns (right),
     * so the other dimension is cut into independent stripes. */
    fn run_triangular<K>(&self, op: &'static str, b: &mut StridedViewMut, a: StridedView,
                         alpha: f64, flags: Flags, kernel: K)
        where K: Fn(&mut StridedViewMut, StridedView, f64, Triangle, &BlockingParams) + Sync
    {
        let shape = triangle_of(flags);
        let params = *self.params();
        let (rows, cols) = (b.rows(), b.cols());
        match self.pool_for(rows.saturating_mul(cols).saturating_mul(a.rows())) {
            None => {
                log::debug!("{} {}x{} {:?} on caller", op, rows, cols, flags);
                kernel(b, a, alpha, shape, &params);
            }
            Some(pool) => {
                let tasks = stripes(rows, cols, self.workers(), !shape.right);
                log::debug!("{} {}x{} {:?} in {} stripes", op, rows, cols, flags, tasks.len());
                run_tasks(pool, b, &tasks, |rect, _| kernel(rect, a, alpha, shape, &params));
            }
        }
    }

    /// `B = alpha*op(A)*B` (LEFT) or `B = alpha*B*op(A)` (RIGHT) in place,
    /// `A` triangular (`LOWER` or `UPPER`, optionally `UNIT`), `op`
    /// selected by `TRANS`.
    pub fn mult_trm(&self, b: &mut impl Dense, a: &impl Dense, alpha: f64, flags: Flags)
                    -> Result<()> {
        let av = a.strided()?;
        let mut bv = b.strided_mut()?;
        Context::check_triangular("mult_trm", &av, &bv, flags.right())?;
        self.run_triangular("mult_trm", &mut bv, av, alpha, flags, trmm::trmm_kernel);
        Ok(())
    }

    /// Solves `op(A)*X = alpha*B` (LEFT) or `X*op(A) = alpha*B` (RIGHT),
    /// overwriting `B` with `X`. Same contract as `mult_trm`.
    pub fn solve(&self, b: &mut impl Dense, a: &impl Dense, alpha: f64, flags: Flags)
                 -> Result<()> {
        let av = a.strided()?;
        let mut bv = b.strided_mut()?;
        Context::check_triangular("solve", &av, &bv, flags.right())?;
        self.run_triangular("solve", &mut bv, av, alpha, flags, trsm::trsm_kernel);
        Ok(())
    }

    fn check_rank_update(op: &'static str, c: &StridedViewMut, ops: &RankOperands)
                         -> Result<()> {
        let n = c.rows();
        if c.cols() != n {
            return Err(Error::mismatch(op, "square C", shape_of(c.rows(), c.cols())));
        }
        let (a_rows, _) = ops.a.op_dims(ops.trans);
        if a_rows != n {
            return Err(Error::mismatch(op, format!("{} rows in op(A)", n),
                                       format!("{} rows", a_rows)));
        }
        if let Some(b) = ops.b {
            if (b.rows(), b.cols()) != (ops.a.rows(), ops.a.cols()) {
                return Err(Error::mismatch(op, format!("B of {}", shape_of(ops.a.rows(), ops.a.cols())),
                                           shape_of(b.rows(), b.cols())));
            }
        }
        Ok(())
    }

    fn run_rank_update(&self, op: &'static str, c: &mut StridedViewMut, ops: RankOperands,
                       alpha: f64, beta: f64, flags: Flags) {
        let lower = flags.lower();
        let params = *self.params();
        let n = c.rows();
        let k = ops.a.op_dims(ops.trans).1;
        match self.pool_for(n.saturating_mul(n).saturating_mul(k)) {
            None => {
                log::debug!("{} {}x{} rank {} {:?} on caller", op, n, n, k, flags);
                syrk::rank_update_blocked(c, ops, alpha, beta, lower, &BlockTask::full(n, n),
                                          &params);
            }
            Some(pool) => {
                let tasks = stripes(n, n, self.workers(), true);
                log::debug!("{} {}x{} rank {} {:?} in {} stripes", op, n, n, k, flags,
                            tasks.len());
                run_tasks(pool, c, &tasks, |rect, task| {
                    syrk::rank_update_blocked(rect, ops, alpha, beta, lower, task, &params)
                });
            }
        }
    }

    /// `C = beta*C + alpha*op(A)*op(A)^T` on the `LOWER` or `UPPER`
    /// (default) triangle of `C`, `op(A) = A^T` with `TRANS`.
    pub fn rank_update_sym(&self, c: &mut impl Dense, a: &impl Dense, alpha: f64, beta: f64,
                           flags: Flags) -> Result<()> {
        let ops = RankOperands { a: a.strided()?, b: None, trans: flags.trans_a() };
        let mut cv = c.strided_mut()?;
        Context::check_rank_update("rank_update_sym", &cv, &ops)?;
        self.run_rank_update("rank_update_sym", &mut cv, ops, alpha, beta, flags);
        Ok(())
    }

    /// `C = beta*C + alpha*(op(A)*op(B)^T + op(B)*op(A)^T)` on the `LOWER`
    /// or `UPPER` (default) triangle of `C`; `A` and `B` have equal shape.
    pub fn rank_update2_sym(&self, c: &mut impl Dense, a: &impl Dense, b: &impl Dense,
                            alpha: f64, beta: f64, flags: Flags) -> Result<()> {
        let ops = RankOperands { a: a.strided()?, b: Some(b.strided()?), trans: flags.trans_a() };
        let mut cv = c.strided_mut()?;
        Context::check_rank_update("rank_update2_sym", &cv, &ops)?;
        self.run_rank_update("rank_update2_sym", &mut cv, ops, alpha, beta, flags);
        Ok(())
    }
}

/// `Context::mult` on the process default context.
pub fn mult(c: &mut impl Dense, a: &impl Dense, b: &impl Dense, alpha: f64, beta: f64,
            flags: Flags) -> Result<()> {
    global_context().mult(c, a, b, alpha, beta, flags)
}

/// `Context::mult_sym` on the process default context.
pub fn mult_sym(c: &mut impl Dense, a: &impl Dense, b: &impl Dense, alpha: f64, beta: f64,
                flags: Flags) -> Result<()> {
    global_context().mult_sym(c, a, b, alpha, beta, flags)
}

/// `Context::mult_trm` on the process default context.
pub fn mult_trm(b: &mut impl Dense, a: &impl Dense, alpha: f64, flags: Flags) -> Result<()> {
    global_context().mult_trm(b, a, alpha, flags)
}

/// `Context::solve` on the process default context.
pub fn solve(b: &mut impl Dense, a: &impl Dense, alpha: f64, flags: Flags) -> Result<()> {
    global_context().solve(b, a, alpha, flags)
}

/// `Context::rank_update_sym` on the process default context.
pub fn rank_update_sym(c: &mut impl Dense, a: &impl Dense, alpha: f64, beta: f64,
                       flags: Flags) -> Result<()> {
    global_context().rank_update_sym(c, a, alpha, beta, flags)
}

/// `Context::rank_update2_sym` on the process default context.
pub fn rank_update2_sym(c: &mut impl Dense, a: &impl Dense, b: &impl Dense, alpha: f64,
                        beta: f64, flags: Flags) -> Result<()> {
    global_context().rank_update2_sym(c, a, b, alpha, beta, flags)
}
