use std::collections::HashMap;
use std::ops::Index;

use ndarray::{Array2, ArrayViewMut2};

use super::ParameterEntity;
use crate::model::error::ModelError;
use crate::model::Dim;

/// A fixed-size table of embeddings with a sparse gradient accumulator.
///
/// Only rows that received a gradient since the last [`clear`](ParameterEntity::clear)
/// have an entry in the accumulator, so rescaling, norm computation and
/// clearing cost is proportional to the number of distinct rows touched,
/// not to the size of the table.
#[derive(Debug, Clone)]
pub struct LookupParameters {
    dim: Dim,
    values: Vec<Array2<f32>>,
    grad: HashMap<usize, Array2<f32>>,
}

impl LookupParameters {
    /// Each row must have shape `dim`
    pub(crate) fn from_rows(dim: Dim, values: Vec<Array2<f32>>) -> Self {
        debug_assert!(values.iter().all(|row| Dim::of(row) == dim));
        Self {
            dim,
            values,
            grad: HashMap::new(),
        }
    }

    /// Number of rows in the table
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Array2<f32>] {
        &self.values
    }

    pub fn row(&self, index: usize) -> Result<&Array2<f32>, ModelError> {
        let len = self.len();
        self.values
            .get(index)
            .ok_or(ModelError::IndexOutOfRange { index, len })
    }

    /// Mutable view of one row; elements can change, the shape cannot
    pub fn row_mut(&mut self, index: usize) -> Result<ArrayViewMut2<'_, f32>, ModelError> {
        let len = self.len();
        self.values
            .get_mut(index)
            .map(|row| row.view_mut())
            .ok_or(ModelError::IndexOutOfRange { index, len })
    }

    pub fn grad(&self) -> &HashMap<usize, Array2<f32>> {
        &self.grad
    }

    /// Accumulated gradient for `index`, or `None` if the row is untouched
    pub fn grad_row(&self, index: usize) -> Option<&Array2<f32>> {
        self.grad.get(&index)
    }

    /// Rows with an accumulated gradient, in no particular order
    pub fn touched_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.grad.keys().copied()
    }

    /// Split borrow for update rules that write rows from their gradients
    pub fn rows_and_grad_mut(
        &mut self,
    ) -> (Vec<ArrayViewMut2<'_, f32>>, &HashMap<usize, Array2<f32>>) {
        let rows = self.values.iter_mut().map(|row| row.view_mut()).collect();
        (rows, &self.grad)
    }

    /// Adds `delta` into the accumulator entry for row `index`, creating it
    /// on first touch
    pub fn accumulate_grad(&mut self, index: usize, delta: &Array2<f32>) -> Result<(), ModelError> {
        if index >= self.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        ModelError::check_dim(self.dim, Dim::of(delta))?;

        self.grad
            .entry(index)
            .and_modify(|g| *g += delta)
            .or_insert_with(|| delta.clone());
        Ok(())
    }

    /// Overwrites every row; table length and row shape must not change
    pub(crate) fn set_values(&mut self, values: Vec<Array2<f32>>) -> Result<(), ModelError> {
        self.check_rows(&values)?;
        self.values = values;
        Ok(())
    }

    pub(crate) fn check_rows(&self, values: &[Array2<f32>]) -> Result<(), ModelError> {
        if values.len() != self.len() {
            return Err(ModelError::StructureMismatch(format!(
                "lookup table has {} rows, got {}",
                self.len(),
                values.len()
            )));
        }
        for row in values {
            ModelError::check_dim(self.dim, Dim::of(row))?;
        }
        Ok(())
    }
}

impl ParameterEntity for LookupParameters {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn size(&self) -> usize {
        self.values.len() * self.dim.size()
    }

    fn rescale_gradient(&mut self, scale: f32) {
        for g in self.grad.values_mut() {
            *g *= scale;
        }
    }

    fn grad_squared_l2norm(&self) -> f32 {
        self.grad
            .values()
            .map(|g| g.iter().map(|x| x * x).sum::<f32>())
            .sum()
    }

    fn clear(&mut self) {
        self.grad.clear();
    }
}

impl Index<usize> for LookupParameters {
    type Output = Array2<f32>;

    fn index(&self, index: usize) -> &Array2<f32> {
        &self.values[index]
    }
}
