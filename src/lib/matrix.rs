use std::fmt;
use super::error::Result;
use super::utilities::{get_idx, random_array};
use super::view::{StridedView, StridedViewMut};

/// What the kernels need from a matrix type: a flat column-major buffer, its
/// leading dimension and extents. The kernels never allocate, copy or
/// transpose storage.
pub trait Dense {
    fn as_slice(&self) -> &[f64];
    fn as_mut_slice(&mut self) -> &mut [f64];
    fn leading_dim(&self) -> usize;
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;

    /// Index of element (0, 0) in the buffer.
    fn offset(&self) -> usize {
        0
    }

    fn num_elements(&self) -> usize {
        self.rows() * self.cols()
    }

    fn strided(&self) -> Result<StridedView<'_>> {
        StridedView::new(self.as_slice(), self.offset(), self.rows(), self.cols(),
                         self.leading_dim())
    }

    fn strided_mut(&mut self) -> Result<StridedViewMut<'_>> {
        let (offset, rows, cols, ld) = (self.offset(), self.rows(), self.cols(),
                                        self.leading_dim());
        StridedViewMut::new(self.as_mut_slice(), offset, rows, cols, ld)
    }
}

/// Dense column-major matrix owning its elements.
#[derive(Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::with_value(rows, cols, 0.0)
    }

    pub fn with_value(rows: usize, cols: usize, val: f64) -> Matrix {
        Matrix { rows, cols, data: vec![val; rows * cols] }
    }

    pub fn from_fn<F: Fn(usize, usize) -> f64>(rows: usize, cols: usize, func: F) -> Matrix {
        let mut data = Vec::with_capacity(rows * cols);
        for col in 0 .. cols {
            for row in 0 .. rows {
                data.push(func(row, col));
            }
        }
        Matrix { rows, cols, data }
    }

    /// Builds a matrix from a table given row by row.
    pub fn from_rows(table: &[&[f64]]) -> Matrix {
        let rows = table.len();
        let cols = table.first().map_or(0, |row| row.len());
        assert!(table.iter().all(|row| row.len() == cols), "ragged table");
        Matrix::from_fn(rows, cols, |row, col| table[row][col])
    }

    /// Uniformly distributed entries in `[low, high)`.
    pub fn random(rows: usize, cols: usize, low: f64, high: f64) -> Matrix {
        if rows == 0 || cols == 0 {
            return Matrix::zeros(rows, cols);
        }
        Matrix { rows, cols, data: random_array(cols, rows, low, high) }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols);
        self.data[get_idx(row, col, self.rows)]
    }

    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        assert!(row < self.rows && col < self.cols);
        self.data[get_idx(row, col, self.rows)] = val;
    }

    pub fn transpose(&self) -> Matrix {
        Matrix::from_fn(self.cols, self.rows, |row, col| self.get(col, row))
    }

    /// Largest elementwise relative difference, `|a - b| / max(1, |a|, |b|)`.
    pub fn max_rel_diff(&self, other: &Matrix) -> f64 {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        self.data.iter().zip(other.data.iter())
            .map(|(a, b)| (a - b).abs() / 1f64.max(a.abs()).max(b.abs()))
            .fold(0.0, f64::max)
    }
}

impl Dense for Matrix {
    fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn leading_dim(&self) -> usize {
        self.rows.max(1)
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Matrix {}x{}", self.rows, self.cols)?;
        for row in 0 .. self.rows {
            for col in 0 .. self.cols {
                write!(f, "{:10.4} ", self.get(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
