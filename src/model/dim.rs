use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Shape of a parameter matrix (or of one row of a lookup table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dim {
    pub rows: usize,
    pub cols: usize,
}

impl Dim {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Column vector of length `n`
    pub fn vector(n: usize) -> Self {
        Self { rows: n, cols: 1 }
    }

    pub fn of(matrix: &Array2<f32>) -> Self {
        let (rows, cols) = matrix.dim();
        Self { rows, cols }
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Dim {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self { rows, cols }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
