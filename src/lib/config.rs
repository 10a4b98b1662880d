use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rayon::{ThreadPool, ThreadPoolBuilder};
use super::error::{Error, Result};

/* Defaults tuned for a 32k L1D: a 68x68 block of C plus two 196 long panels
 * of A and B stay resident while a block is accumulated. */
pub const DEFAULT_PANEL_LEN: usize = 196;
pub const DEFAULT_COL_BLOCK: usize = 68;
pub const DEFAULT_ROW_BLOCK: usize = 68;

/// Problems with `output elements * contraction length` at or below this run
/// on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 200 * 200 * 200;

/// Block sizes used by every blocked kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingParams {
    panel_len: usize,
    col_block: usize,
    row_block: usize,
}

impl BlockingParams {
    pub fn new(panel_len: usize, col_block: usize, row_block: usize) -> Result<BlockingParams> {
        if panel_len == 0 || col_block == 0 || row_block == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "block sizes must be positive, got panel {} col {} row {}",
                panel_len, col_block, row_block)));
        }
        Ok(BlockingParams { panel_len, col_block, row_block })
    }

    /// Same size for all three parameters.
    pub fn uniform(size: usize) -> Result<BlockingParams> {
        BlockingParams::new(size, size, size)
    }

    /// Length of the contraction panel fed to one micro-kernel call.
    #[inline(always)]
    pub fn panel_len(&self) -> usize {
        self.panel_len
    }

    /// Columns per block of the output, also the diagonal block size of the
    /// triangular and rank update kernels.
    #[inline(always)]
    pub fn col_block(&self) -> usize {
        self.col_block
    }

    /// Rows per block of the output.
    #[inline(always)]
    pub fn row_block(&self) -> usize {
        self.row_block
    }
}

impl Default for BlockingParams {
    fn default() -> BlockingParams {
        BlockingParams {
            panel_len: DEFAULT_PANEL_LEN,
            col_block: DEFAULT_COL_BLOCK,
            row_block: DEFAULT_ROW_BLOCK,
        }
    }
}

/// Number of physical cores, a sensible worker count for `set_workers`.
pub fn default_workers() -> usize {
    num_cpus::get_physical().max(1)
}

/// Blocking parameters, worker count and the pool the workers run on. Every
/// entry point reads its configuration from a `Context`, so two contexts
/// never interfere with each other.
#[derive(Clone)]
pub struct Context {
    params: BlockingParams,
    workers: usize,
    threshold: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl Context {
    pub fn new(params: BlockingParams) -> Context {
        Context { params, workers: 1, threshold: PARALLEL_THRESHOLD, pool: None }
    }

    pub fn with_workers(mut self, workers: usize) -> Context {
        self.set_workers(workers);
        self
    }

    /// Overrides the size below which work is not partitioned. Mostly
    /// useful to exercise the scheduler on small inputs.
    pub fn with_threshold(mut self, threshold: usize) -> Context {
        self.threshold = threshold;
        self
    }

    pub fn params(&self) -> &BlockingParams {
        &self.params
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn set_blocking(&mut self, params: BlockingParams) {
        self.params = params;
    }

    /// Sets the worker count and returns the previous one. Zero is treated
    /// as one.
    pub fn set_workers(&mut self, workers: usize) -> usize {
        let old = self.workers;
        let workers = workers.max(1);
        if workers == old && (workers == 1 || self.pool.is_some()) {
            return old;
        }

        self.workers = workers;
        self.pool = None;
        if workers > 1 {
            match ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|idx| format!("kobold-worker-{}", idx))
                .build()
            {
                Ok(pool) => self.pool = Some(Arc::new(pool)),
                Err(err) => {
                    log::warn!("could not start {} workers, running single threaded: {}",
                               workers, err);
                    self.workers = 1;
                }
            }
        }
        old
    }

    /// The pool to partition over, if this problem size warrants it.
    pub(crate) fn pool_for(&self, psize: usize) -> Option<&ThreadPool> {
        if self.workers <= 1 || psize <= self.threshold {
            return None;
        }
        self.pool.as_deref()
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new(BlockingParams::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("params", &self.params)
            .field("workers", &self.workers)
            .field("threshold", &self.threshold)
            .finish()
    }
}

fn global() -> &'static RwLock<Context> {
    static GLOBAL: OnceLock<RwLock<Context>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(Context::default()))
}

pub(crate) fn global_context() -> RwLockReadGuard<'static, Context> {
    global().read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn global_context_mut() -> RwLockWriteGuard<'static, Context> {
    global().write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets the blocking parameters of the process default context.
pub fn set_blocking_params(params: BlockingParams) {
    global_context_mut().set_blocking(params)
}

/// Sets the worker count of the process default context, returning the
/// previous count.
pub fn num_workers(workers: usize) -> usize {
    global_context_mut().set_workers(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sizes() {
        assert!(BlockingParams::new(0, 4, 4).is_err());
        assert!(BlockingParams::new(4, 0, 4).is_err());
        assert!(BlockingParams::new(4, 4, 0).is_err());
        assert_eq!(BlockingParams::uniform(8).unwrap().row_block(), 8);
    }

    #[test]
    fn set_workers_returns_previous() {
        let mut ctx = Context::default();
        assert_eq!(ctx.set_workers(4), 1);
        assert_eq!(ctx.set_workers(0), 4);
        assert_eq!(ctx.workers(), 1);
        assert!(ctx.pool_for(usize::MAX).is_none());
    }

    #[test]
    fn small_problems_stay_on_caller() {
        let ctx = Context::default().with_workers(2);
        assert!(ctx.pool_for(PARALLEL_THRESHOLD).is_none());
        assert!(ctx.pool_for(PARALLEL_THRESHOLD + 1).is_some());
    }
}
