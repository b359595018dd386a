use std::ops::{Index, IndexMut};

use ndarray::{Array2, ArrayViewMut2};

use super::ParameterEntity;
use crate::model::error::ModelError;
use crate::model::Dim;

/// A densely updated weight matrix with its gradient accumulator
#[derive(Debug, Clone)]
pub struct Parameters {
    dim: Dim,
    values: Array2<f32>,
    grad: Array2<f32>,
}

impl Parameters {
    /// Takes ownership of `values`; the gradient starts at zero
    pub(crate) fn from_values(values: Array2<f32>) -> Self {
        let dim = Dim::of(&values);
        Self {
            dim,
            values,
            grad: Array2::zeros(dim.as_tuple()),
        }
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Mutable view of the values; elements can change, the shape cannot
    pub fn values_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.values.view_mut()
    }

    pub fn grad(&self) -> &Array2<f32> {
        &self.grad
    }

    /// Split borrow for update rules that write `values` from `grad`
    pub fn values_and_grad_mut(&mut self) -> (ArrayViewMut2<'_, f32>, &Array2<f32>) {
        (self.values.view_mut(), &self.grad)
    }

    /// Adds `delta` into the gradient accumulator
    pub fn accumulate_grad(&mut self, delta: &Array2<f32>) -> Result<(), ModelError> {
        ModelError::check_dim(self.dim, Dim::of(delta))?;
        self.grad += delta;
        Ok(())
    }

    /// Overwrites `values`; the shape must not change
    pub(crate) fn set_values(&mut self, values: Array2<f32>) -> Result<(), ModelError> {
        ModelError::check_dim(self.dim, Dim::of(&values))?;
        self.values = values;
        Ok(())
    }
}

impl ParameterEntity for Parameters {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn size(&self) -> usize {
        self.dim.size()
    }

    fn rescale_gradient(&mut self, scale: f32) {
        self.grad *= scale;
    }

    fn grad_squared_l2norm(&self) -> f32 {
        self.grad.iter().map(|g| g * g).sum()
    }

    fn clear(&mut self) {
        self.grad.fill(0.0);
    }
}

impl Index<(usize, usize)> for Parameters {
    type Output = f32;

    fn index(&self, (i, j): (usize, usize)) -> &f32 {
        &self.values[[i, j]]
    }
}

impl IndexMut<(usize, usize)> for Parameters {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f32 {
        &mut self.values[[i, j]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use proptest::prelude::*;

    fn params(values: Array2<f32>) -> Parameters {
        Parameters::from_values(values)
    }

    #[test]
    fn test_new_has_zero_grad() {
        let p = params(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(p.dim(), Dim::new(2, 3));
        assert_eq!(p.grad().dim(), (2, 3));
        assert!(p.grad().iter().all(|&g| g == 0.0));
        assert_eq!(p.size(), 6);
    }

    #[test]
    fn test_accumulate_then_clear() {
        let mut p = params(Array2::zeros((2, 2)));
        p.accumulate_grad(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        p.accumulate_grad(&array![[0.5, 0.5], [0.5, 0.5]]).unwrap();
        assert_eq!(p.grad(), &array![[1.5, 2.5], [3.5, 4.5]]);

        p.clear();
        assert!(p.grad().iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_accumulate_wrong_shape_leaves_grad() {
        let mut p = params(Array2::zeros((2, 2)));
        p.accumulate_grad(&array![[1.0, 1.0], [1.0, 1.0]]).unwrap();

        let err = p.accumulate_grad(&Array2::ones((2, 3))).unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                expected: Dim::new(2, 2),
                found: Dim::new(2, 3),
            }
        );
        assert_eq!(p.grad(), &array![[1.0, 1.0], [1.0, 1.0]]);
    }

    #[test]
    fn test_rescale_and_norm() {
        let mut p = params(Array2::zeros((1, 2)));
        p.accumulate_grad(&array![[3.0, 4.0]]).unwrap();
        assert_abs_diff_eq!(p.grad_squared_l2norm(), 25.0, epsilon = 1e-6);

        p.rescale_gradient(0.5);
        assert_eq!(p.grad(), &array![[1.5, 2.0]]);
        assert_abs_diff_eq!(p.grad_squared_l2norm(), 6.25, epsilon = 1e-6);
    }

    #[test]
    fn test_element_access_touches_values_only() {
        let mut p = params(array![[1.0, 2.0], [3.0, 4.0]]);
        p[(1, 0)] = 9.0;
        assert_eq!(p[(1, 0)], 9.0);
        assert_eq!(p.values()[[1, 0]], 9.0);
        assert_eq!(p.grad()[[1, 0]], 0.0);
    }

    #[test]
    #[should_panic]
    fn test_element_access_out_of_bounds() {
        let p = params(Array2::zeros((2, 2)));
        let _ = p[(2, 0)];
    }

    #[test]
    fn test_split_borrow_update() {
        let mut p = params(array![[1.0, 1.0]]);
        p.accumulate_grad(&array![[2.0, -2.0]]).unwrap();
        let (mut values, grad) = p.values_and_grad_mut();
        values.scaled_add(-0.5, grad);
        assert_eq!(p.values(), &array![[0.0, 2.0]]);
    }

    #[test]
    fn test_values_mut_keeps_shape() {
        let mut p = params(Array2::zeros((2, 2)));
        p.values_mut().assign(&array![[1.0, 2.0], [3.0, 4.0]]);
        p.values_mut().fill(5.0);
        assert_eq!(p.values(), &Array2::from_elem((2, 2), 5.0));

        let (mut values, _) = p.values_and_grad_mut();
        values.row_mut(0).fill(0.0);
        assert_eq!(p.values().dim(), (2, 2));
        assert_eq!(p.values(), &array![[0.0, 0.0], [5.0, 5.0]]);
        assert_eq!(Dim::of(p.values()), p.dim());
        assert_eq!(Dim::of(p.grad()), p.dim());
    }

    #[test]
    fn test_set_values_rejects_new_shape() {
        let mut p = params(Array2::zeros((2, 2)));
        assert!(p.set_values(Array2::ones((3, 2))).is_err());
        assert!(p.values().iter().all(|&v| v == 0.0));
    }

    fn deltas() -> impl Strategy<Value = Vec<Vec<f32>>> {
        prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 6), 1..8)
    }

    proptest! {
        #[test]
        fn prop_grad_is_sum_of_deltas(deltas in deltas()) {
            let mut p = params(Array2::zeros((2, 3)));
            let mut expected = Array2::<f32>::zeros((2, 3));
            for d in &deltas {
                let delta = Array2::from_shape_vec((2, 3), d.clone()).unwrap();
                p.accumulate_grad(&delta).unwrap();
                expected += &delta;
            }
            prop_assert_eq!(p.grad(), &expected);
            p.clear();
            prop_assert!(p.grad().iter().all(|&g| g == 0.0));
        }

        #[test]
        fn prop_rescale_multiplies_grad(d in prop::collection::vec(-10.0f32..10.0, 6), c in -4.0f32..4.0) {
            let mut p = params(Array2::zeros((3, 2)));
            let delta = Array2::from_shape_vec((3, 2), d).unwrap();
            p.accumulate_grad(&delta).unwrap();
            p.rescale_gradient(c);
            prop_assert_eq!(p.grad(), &(&delta * c));
        }
    }
}
