use std::marker::PhantomData;
use super::scheduler::BlockTask;
use super::view::StridedViewMut;

/* The address travels as a plain usize so the handle is Send + Sync and can be
 * captured by every task of a scope. Handing out rectangles is the only
 * operation, and it is unsafe: the scheduler is the one place that knows the
 * rectangles it hands out never overlap. */
pub struct SharedMut<'a> {
    addr: usize,
    len: usize,
    offset: usize,
    rows: usize,
    cols: usize,
    ld: usize,
    _marker: PhantomData<&'a mut [f64]>,
}

impl<'a> SharedMut<'a> {
    pub fn new(view: &'a mut StridedViewMut<'_>) -> SharedMut<'a> {
        let (ptr, len, offset, rows, cols, ld) = view.raw_parts();
        SharedMut {
            addr: ptr as usize,
            len,
            offset,
            rows,
            cols,
            ld,
            _marker: PhantomData,
        }
    }

    /// Writable view of the rectangle `task` of the shared output.
    ///
    /// # Safety
    /// No two live views obtained from the same handle may overlap.
    pub unsafe fn rect(&self, task: &BlockTask) -> StridedViewMut<'a> {
        assert!(task.row_end <= self.rows && task.col_end <= self.cols,
                "{:?} outside {}x{} output", task, self.rows, self.cols);
        let offset = self.offset + task.row_start + task.col_start * self.ld;
        StridedViewMut::from_raw(self.addr as *mut f64, self.len, offset,
                                 task.rows(), task.cols(), self.ld)
    }
}
