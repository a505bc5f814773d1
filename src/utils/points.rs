//! Dense row-major storage for `N` points in `D` dimensions.
//!
//! The tree borrows a `Points` for its whole lifetime and refers to points
//! by row index, so the coordinates cannot be moved while a tree exists.
//!
//! # Example
//!
//! ```
//! use rs_sptree::utils::Points;
//!
//! let points = Points::new(vec![0.0, 0.0, 2.0, 4.0], 2).expect("valid buffer");
//! assert_eq!(points.len(), 2);
//! assert_eq!(points.row(1), &[2.0, 4.0]);
//! assert_eq!(points.mean(), vec![1.0, 2.0]);
//! ```
use crate::utils::SpTreeError;

#[derive(Debug, Clone, PartialEq)]
pub struct Points {
    data: Vec<f64>,
    dims: usize,
}

impl Points {
    /// Wraps a flat row-major buffer of `data.len() / dims` points.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPointSet` if `dims` is zero, and `DimensionMismatch` if the
    /// buffer length is not a multiple of `dims`.
    pub fn new(data: Vec<f64>, dims: usize) -> Result<Self, SpTreeError> {
        if dims == 0 {
            return Err(SpTreeError::EmptyPointSet);
        }
        if data.len() % dims != 0 {
            return Err(SpTreeError::DimensionMismatch {
                expected: (data.len() / dims + 1) * dims,
                actual: data.len(),
            });
        }
        Ok(Self { data, dims })
    }

    /// Builds a point set from individual rows, which must all have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, SpTreeError> {
        let dims = rows.first().map(|r| r.as_ref().len()).ok_or(SpTreeError::EmptyPointSet)?;
        let mut data = Vec::with_capacity(rows.len() * dims);
        for row in rows {
            let row = row.as_ref();
            if row.len() != dims {
                return Err(SpTreeError::DimensionMismatch { expected: dims, actual: row.len() });
            }
            data.extend_from_slice(row);
        }
        Self::new(data, dims)
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coordinates of point `index`. Panics if the index is out of range.
    #[inline]
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.dims;
        &self.data[start..start + self.dims]
    }

    /// Coordinates of point `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        if index < self.len() {
            Some(self.row(index))
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the flat buffer, for optimizers that move points between builds.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dims)
    }

    /// Per-dimension arithmetic mean. All zeros for an empty set.
    pub fn mean(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.dims];
        let n = self.len();
        if n == 0 {
            return mean;
        }
        for row in self.rows() {
            for (m, &x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        let inv = 1.0 / n as f64;
        mean.iter_mut().for_each(|m| *m *= inv);
        mean
    }

    /// Per-dimension minimum. `+inf` in every slot for an empty set.
    pub fn min(&self) -> Vec<f64> {
        self.rows().fold(vec![f64::INFINITY; self.dims], |mut acc, row| {
            for (a, &x) in acc.iter_mut().zip(row) {
                *a = a.min(x);
            }
            acc
        })
    }

    /// Per-dimension maximum. `-inf` in every slot for an empty set.
    pub fn max(&self) -> Vec<f64> {
        self.rows().fold(vec![f64::NEG_INFINITY; self.dims], |mut acc, row| {
            for (a, &x) in acc.iter_mut().zip(row) {
                *a = a.max(x);
            }
            acc
        })
    }

    /// Index of the first point with a NaN or infinite coordinate.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.rows().position(|row| row.iter().any(|x| !x.is_finite()))
    }
}
