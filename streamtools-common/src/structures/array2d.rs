use std::io::{Error, ErrorKind};
use std::ops::Index;

/// A dense, row-major 2D grid. Reads outside of the grid return the `nodata`
/// value and writes outside of the grid are ignored, which keeps neighbourhood
/// scans free of explicit bounds checks.
///
/// Cells can also be addressed by their flat index (`row * columns + column`),
/// which is how the flow algorithms store their per-cell state.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2D<T: Copy> {
    pub columns: isize,
    pub rows: isize,
    data: Vec<T>,
    pub nodata: T,
}

impl<T: Copy> Array2D<T> {
    pub fn new(rows: isize, columns: isize, initial_value: T, nodata: T) -> Result<Array2D<T>, Error> {
        if rows < 0 || columns < 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Only non-negative rows and columns values accepted.",
            ));
        }
        let data = vec![initial_value; (rows * columns) as usize];
        Ok(Array2D {
            columns,
            rows,
            data,
            nodata,
        })
    }

    /// Builds a grid from row-major data. The data length must equal `rows * columns`.
    pub fn from_data(rows: isize, columns: isize, data: Vec<T>, nodata: T) -> Result<Array2D<T>, Error> {
        if rows < 0 || columns < 0 || data.len() != (rows * columns) as usize {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Data of length {} cannot fill a grid of {} rows and {} columns.",
                    data.len(),
                    rows,
                    columns
                ),
            ));
        }
        Ok(Array2D {
            columns,
            rows,
            data,
            nodata,
        })
    }

    /// A new grid with the same shape as this one.
    pub fn new_like<U: Copy>(&self, initial_value: U, nodata: U) -> Array2D<U> {
        Array2D {
            columns: self.columns,
            rows: self.rows,
            data: vec![initial_value; self.data.len()],
            nodata,
        }
    }

    #[inline]
    pub fn is_in_bounds(&self, row: isize, column: isize) -> bool {
        row >= 0 && column >= 0 && row < self.rows && column < self.columns
    }

    #[inline]
    pub fn set_value(&mut self, row: isize, column: isize, value: T) {
        if self.is_in_bounds(row, column) {
            self.data[(row * self.columns + column) as usize] = value;
        }
    }

    #[inline]
    pub fn get_value(&self, row: isize, column: isize) -> T {
        if self.is_in_bounds(row, column) {
            self.data[(row * self.columns + column) as usize]
        } else {
            self.nodata
        }
    }

    #[inline]
    pub fn get_by_index(&self, index: usize) -> T {
        self.data[index]
    }

    #[inline]
    pub fn set_by_index(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    pub fn get_row_data(&self, row: isize) -> Vec<T> {
        if row < 0 || row >= self.rows {
            return vec![self.nodata; self.columns as usize];
        }
        let start = (row * self.columns) as usize;
        self.data[start..start + self.columns as usize].to_vec()
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<T>) {
        for (column, value) in values.into_iter().enumerate().take(self.columns as usize) {
            self.set_value(row, column as isize, value);
        }
    }

    pub fn num_cells(&self) -> usize {
        self.data.len()
    }
}

impl<T: Copy> Index<(isize, isize)> for Array2D<T> {
    type Output = T;

    fn index(&self, index: (isize, isize)) -> &T {
        let (row, column) = index;
        if self.is_in_bounds(row, column) {
            &self.data[(row * self.columns + column) as usize]
        } else {
            &self.nodata
        }
    }
}
