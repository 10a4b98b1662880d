use std::marker::PhantomData;
use super::error::{Error, Result};
use super::utilities::get_idx;

/* All views are column-major: element (i, j) lives at offset + i + j*ld.
 * Transposition never touches storage, kernels only change which lanes
 * (rows or columns) they walk. Views keep a raw base pointer instead of a
 * slice so a writable view and a read-only view over disjoint parts of the
 * same buffer may coexist, e.g. the solved and the unsolved rows of B in a
 * triangular solve. */

fn check_extent(len: usize, offset: usize, rows: usize, cols: usize, ld: usize) -> Result<()> {
    let fits = if rows == 0 || cols == 0 {
        offset <= len
    } else {
        (cols - 1).checked_mul(ld)
            .and_then(|last| last.checked_add(offset))
            .and_then(|last| last.checked_add(rows))
            .map_or(false, |end| end <= len)
    };

    if ld < rows.max(1) || !fits {
        return Err(Error::InvalidView { offset, rows, cols, ld, len });
    }
    Ok(())
}

/// A row or a column of a view: `len` elements `inc` apart.
#[derive(Clone, Copy)]
pub struct Lane<'a> {
    ptr: *const f64,
    start: usize,
    inc: usize,
    len: usize,
    _marker: PhantomData<&'a [f64]>,
}

unsafe impl<'a> Send for Lane<'a> {}
unsafe impl<'a> Sync for Lane<'a> {}

impl<'a> Lane<'a> {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, k: usize) -> f64 {
        assert!(k < self.len, "lane index {} out of bounds ({})", k, self.len);
        self.at(k)
    }

    #[inline(always)]
    pub(crate) fn at(&self, k: usize) -> f64 {
        debug_assert!(k < self.len);
        unsafe { *self.ptr.add(self.start + k * self.inc) }
    }

    /// Elements `[from, to)` of this lane.
    #[inline(always)]
    pub fn range(&self, from: usize, to: usize) -> Lane<'a> {
        assert!(from <= to && to <= self.len, "lane range {}..{} out of bounds ({})",
                from, to, self.len);
        Lane {
            ptr: self.ptr,
            start: self.start + from * self.inc,
            inc: self.inc,
            len: to - from,
            _marker: PhantomData,
        }
    }
}

/// Read-only strided view of a column-major matrix.
#[derive(Clone, Copy)]
pub struct StridedView<'a> {
    ptr: *const f64,
    offset: usize,
    rows: usize,
    cols: usize,
    ld: usize,
    _marker: PhantomData<&'a [f64]>,
}

unsafe impl<'a> Send for StridedView<'a> {}
unsafe impl<'a> Sync for StridedView<'a> {}

impl<'a> StridedView<'a> {
    pub fn new(buf: &'a [f64], offset: usize, rows: usize, cols: usize, ld: usize)
               -> Result<StridedView<'a>> {
        check_extent(buf.len(), offset, rows, cols, ld)?;
        Ok(StridedView {
            ptr: buf.as_ptr(),
            offset,
            rows,
            cols,
            ld,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape of `op(self)`.
    #[inline(always)]
    pub fn op_dims(&self, trans: bool) -> (usize, usize) {
        if trans {
            (self.cols, self.rows)
        } else {
            (self.rows, self.cols)
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols,
                "({}, {}) out of bounds for {}x{} view", row, col, self.rows, self.cols);
        self.at(row, col)
    }

    #[inline(always)]
    pub(crate) fn at(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        unsafe { *self.ptr.add(self.offset + get_idx(row, col, self.ld)) }
    }

    pub fn sub(&self, row: usize, col: usize, rows: usize, cols: usize) -> StridedView<'a> {
        assert!(row + rows <= self.rows && col + cols <= self.cols,
                "{}x{} block at ({}, {}) exceeds {}x{} view",
                rows, cols, row, col, self.rows, self.cols);
        StridedView {
            ptr: self.ptr,
            offset: self.offset + get_idx(row, col, self.ld),
            rows,
            cols,
            ld: self.ld,
            _marker: PhantomData,
        }
    }

    /// The view `X` for which `op(X)` is the `rows x cols` block of `op(self)`
    /// at `(row, col)`.
    #[inline(always)]
    pub fn op_sub(&self, trans: bool, row: usize, col: usize, rows: usize, cols: usize)
                  -> StridedView<'a> {
        if trans {
            self.sub(col, row, cols, rows)
        } else {
            self.sub(row, col, rows, cols)
        }
    }

    #[inline(always)]
    pub fn row(&self, row: usize) -> Lane<'a> {
        assert!(row < self.rows);
        Lane {
            ptr: self.ptr,
            start: self.offset + row,
            inc: self.ld,
            len: self.cols,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn col(&self, col: usize) -> Lane<'a> {
        assert!(col < self.cols);
        Lane {
            ptr: self.ptr,
            start: self.offset + col * self.ld,
            inc: 1,
            len: self.rows,
            _marker: PhantomData,
        }
    }

    /// Row `row` of `op(self)`.
    #[inline(always)]
    pub fn op_row(&self, row: usize, trans: bool) -> Lane<'a> {
        if trans {
            self.col(row)
        } else {
            self.row(row)
        }
    }

    /// Column `col` of `op(self)`.
    #[inline(always)]
    pub fn op_col(&self, col: usize, trans: bool) -> Lane<'a> {
        if trans {
            self.row(col)
        } else {
            self.col(col)
        }
    }
}

/// Writable strided view of a column-major matrix.
pub struct StridedViewMut<'a> {
    ptr: *mut f64,
    len: usize,
    offset: usize,
    rows: usize,
    cols: usize,
    ld: usize,
    _marker: PhantomData<&'a mut [f64]>,
}

unsafe impl<'a> Send for StridedViewMut<'a> {}

impl<'a> StridedViewMut<'a> {
    pub fn new(buf: &'a mut [f64], offset: usize, rows: usize, cols: usize, ld: usize)
               -> Result<StridedViewMut<'a>> {
        check_extent(buf.len(), offset, rows, cols, ld)?;
        Ok(StridedViewMut {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
            offset,
            rows,
            cols,
            ld,
            _marker: PhantomData,
        })
    }

    /// Rebuilds a view from parts taken with `raw_parts`.
    ///
    /// # Safety
    /// The parts must describe a live view and no other view may touch the
    /// same elements while the returned one is in use.
    pub(crate) unsafe fn from_raw(ptr: *mut f64, len: usize, offset: usize,
                                  rows: usize, cols: usize, ld: usize) -> StridedViewMut<'a> {
        debug_assert!(check_extent(len, offset, rows, cols, ld).is_ok());
        StridedViewMut { ptr, len, offset, rows, cols, ld, _marker: PhantomData }
    }

    pub(crate) fn raw_parts(&mut self) -> (*mut f64, usize, usize, usize, usize, usize) {
        (self.ptr, self.len, self.offset, self.rows, self.cols, self.ld)
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols,
                "({}, {}) out of bounds for {}x{} view", row, col, self.rows, self.cols);
        self.at(row, col)
    }

    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        assert!(row < self.rows && col < self.cols,
                "({}, {}) out of bounds for {}x{} view", row, col, self.rows, self.cols);
        self.put(row, col, val)
    }

    #[inline(always)]
    pub(crate) fn at(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        let idx = self.offset + get_idx(row, col, self.ld);
        debug_assert!(idx < self.len);
        unsafe { *self.ptr.add(idx) }
    }

    #[inline(always)]
    pub(crate) fn put(&mut self, row: usize, col: usize, val: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        let idx = self.offset + get_idx(row, col, self.ld);
        debug_assert!(idx < self.len);
        unsafe { *self.ptr.add(idx) = val }
    }

    /// Read-only view of the same elements.
    pub fn view(&self) -> StridedView<'_> {
        StridedView {
            ptr: self.ptr as *const f64,
            offset: self.offset,
            rows: self.rows,
            cols: self.cols,
            ld: self.ld,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn row(&self, row: usize) -> Lane<'_> {
        self.view().row(row)
    }

    #[inline(always)]
    pub fn col(&self, col: usize) -> Lane<'_> {
        self.view().col(col)
    }

    pub fn sub_mut(&mut self, row: usize, col: usize, rows: usize, cols: usize)
                   -> StridedViewMut<'_> {
        assert!(row + rows <= self.rows && col + cols <= self.cols,
                "{}x{} block at ({}, {}) exceeds {}x{} view",
                rows, cols, row, col, self.rows, self.cols);
        StridedViewMut {
            ptr: self.ptr,
            len: self.len,
            offset: self.offset + get_idx(row, col, self.ld),
            rows,
            cols,
            ld: self.ld,
            _marker: PhantomData,
        }
    }

    /// Splits into rows `[0, row)` and `[row, rows)`.
    pub fn split_rows(&mut self, row: usize) -> (StridedViewMut<'_>, StridedViewMut<'_>) {
        assert!(row <= self.rows);
        let top = StridedViewMut {
            ptr: self.ptr,
            len: self.len,
            offset: self.offset,
            rows: row,
            cols: self.cols,
            ld: self.ld,
            _marker: PhantomData,
        };
        let bottom = StridedViewMut {
            ptr: self.ptr,
            len: self.len,
            offset: self.offset + row,
            rows: self.rows - row,
            cols: self.cols,
            ld: self.ld,
            _marker: PhantomData,
        };
        (top, bottom)
    }

    /// Splits into columns `[0, col)` and `[col, cols)`.
    pub fn split_cols(&mut self, col: usize) -> (StridedViewMut<'_>, StridedViewMut<'_>) {
        assert!(col <= self.cols);
        let left = StridedViewMut {
            ptr: self.ptr,
            len: self.len,
            offset: self.offset,
            rows: self.rows,
            cols: col,
            ld: self.ld,
            _marker: PhantomData,
        };
        let right = StridedViewMut {
            ptr: self.ptr,
            len: self.len,
            offset: self.offset + col * self.ld,
            rows: self.rows,
            cols: self.cols - col,
            ld: self.ld,
            _marker: PhantomData,
        };
        (left, right)
    }

    /// `self = beta*self`. With `beta == 0` the old contents are not read.
    pub fn scale(&mut self, beta: f64) {
        if beta == 1.0 {
            return;
        }
        for col in 0 .. self.cols {
            for row in 0 .. self.rows {
                let val = if beta == 0.0 { 0.0 } else { beta * self.at(row, col) };
                self.put(row, col, val);
            }
        }
    }
}
