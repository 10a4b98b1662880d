use std::sync::atomic::{AtomicUsize, Ordering};
use rayon::ThreadPool;
use super::danger_math::SharedMut;
use super::view::StridedViewMut;

/// Partition boundaries are aligned to this many elements.
pub const ALIGN: usize = 4;
/// Alignment of the finer grained one dimensional stripes.
pub const FINE_ALIGN: usize = 2;

/// A rectangle `[row_start, row_end) x [col_start, col_end)` of an output
/// matrix, processed by exactly one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTask {
    pub col_start: usize,
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl BlockTask {
    /// The whole `rows x cols` output.
    pub fn full(rows: usize, cols: usize) -> BlockTask {
        BlockTask { col_start: 0, col_end: cols, row_start: 0, row_end: rows }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.col_end - self.col_start
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn overlaps(&self, other: &BlockTask) -> bool {
        !self.is_empty() && !other.is_empty()
            && self.row_start < other.row_end && other.row_start < self.row_end
            && self.col_start < other.col_end && other.col_start < self.col_end
    }
}

/// Start of group `i` when `size` elements are spread over `groups`
/// groups, rounded down to a multiple of `align`. Group `groups` starts at
/// `size`, so the last group takes whatever the rounding left over.
pub fn block_index(i: usize, groups: usize, size: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    if i == groups {
        return size;
    }
    let idx = i * size / groups;
    idx - (idx & (align - 1))
}

fn integer_sqrt(num: usize) -> usize {
    let mut root = (num as f64).sqrt() as usize;
    while root * root > num {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= num {
        root += 1;
    }
    root
}

/// Shape of the worker grid as `(col_workers, row_workers)`; their product
/// is always `workers`.
pub fn divide_work(rows: usize, cols: usize, workers: usize) -> (usize, usize) {
    let workers = workers.max(1);
    let root = integer_sqrt(workers);

    if workers == 2 || workers & 0x1 != 0 {
        /* Odd count: everything along the longer side */
        if cols > rows {
            (workers, 1)
        } else {
            (1, workers)
        }
    } else if root * root == workers {
        (root, root)
    } else {
        /* Even, not square: two along the shorter side */
        if cols > rows {
            (workers / 2, 2)
        } else {
            (2, workers / 2)
        }
    }
}

/// The `col_workers x row_workers` grid of rectangles covering a
/// `rows x cols` output, column groups outermost.
pub fn partition(rows: usize, cols: usize, col_workers: usize, row_workers: usize,
                 align: usize) -> Vec<BlockTask> {
    let mut tasks = Vec::with_capacity(col_workers * row_workers);
    for k in 0 .. col_workers {
        let col_start = block_index(k, col_workers, cols, align);
        let col_end = block_index(k + 1, col_workers, cols, align);
        for l in 0 .. row_workers {
            let row_start = block_index(l, row_workers, rows, align);
            let row_end = block_index(l + 1, row_workers, rows, align);
            tasks.push(BlockTask { col_start, col_end, row_start, row_end });
        }
    }
    tasks
}

/// Independent column (`by_cols`) or row stripes of a `rows x cols` output,
/// one per worker.
pub fn stripes(rows: usize, cols: usize, workers: usize, by_cols: bool) -> Vec<BlockTask> {
    if by_cols {
        partition(rows, cols, workers, 1, FINE_ALIGN)
    } else {
        partition(rows, cols, 1, workers, FINE_ALIGN)
    }
}

fn pairwise_disjoint(tasks: &[BlockTask]) -> bool {
    tasks.iter().enumerate()
        .all(|(idx, task)| tasks[idx + 1 ..].iter().all(|other| !task.overlaps(other)))
}

/// Runs `kernel` once per non-empty task on `pool`, each call getting a
/// writable view of its own rectangle of `out`, and returns once every task
/// has finished.
pub fn run_tasks<F>(pool: &ThreadPool, out: &mut StridedViewMut, tasks: &[BlockTask], kernel: F)
    where F: Fn(&mut StridedViewMut, &BlockTask) + Sync
{
    assert!(pairwise_disjoint(tasks), "overlapping output rectangles: {:?}", tasks);
    let ntask = tasks.iter().filter(|task| !task.is_empty()).count();
    log::debug!("dispatching {} tasks over {} workers", ntask, pool.current_num_threads());

    let ready = AtomicUsize::new(0);
    let shared = SharedMut::new(out);
    pool.scope(|scope| {
        for task in tasks.iter().filter(|task| !task.is_empty()) {
            let (shared, kernel, ready) = (&shared, &kernel, &ready);
            scope.spawn(move |_| {
                /* Rectangles were checked pairwise disjoint above */
                let mut rect = unsafe { shared.rect(task) };
                log::trace!("task {:?} started", task);
                kernel(&mut rect, task);
                ready.fetch_add(1, Ordering::Release);
            });
        }
    });

    let nready = ready.load(Ordering::Acquire);
    debug_assert_eq!(nready, ntask);
    log::trace!("{} of {} tasks ready", nready, ntask);
}
