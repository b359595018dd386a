use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ModelError;
use super::params::{LookupParameters, ParameterEntity, Parameters};
use super::{Dim, Model};

/// Persisted state of dense parameters. Gradients are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseState {
    pub dim: Dim,
    pub values: Array2<f32>,
}

/// Persisted state of a lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupState {
    pub dim: Dim,
    pub values: Vec<Array2<f32>>,
}

/// Owned parameter values of a model, as read back from storage.
///
/// Field order is the persisted order: the dense count, the lookup count,
/// every dense state in creation order, then every lookup state in
/// creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub num_parameters: usize,
    pub num_lookup_parameters: usize,
    pub parameters: Vec<DenseState>,
    pub lookup_parameters: Vec<LookupState>,
}

/// Borrowed view of a model's values; serializes identically to [`ModelSnapshot`]
#[derive(Debug, Serialize)]
pub struct ModelSnapshotRef<'a> {
    num_parameters: usize,
    num_lookup_parameters: usize,
    parameters: Vec<DenseStateRef<'a>>,
    lookup_parameters: Vec<LookupStateRef<'a>>,
}

#[derive(Debug, Serialize)]
struct DenseStateRef<'a> {
    dim: Dim,
    values: &'a Array2<f32>,
}

#[derive(Debug, Serialize)]
struct LookupStateRef<'a> {
    dim: Dim,
    values: &'a [Array2<f32>],
}

impl<'a> ModelSnapshotRef<'a> {
    pub fn num_parameters(&self) -> usize {
        self.num_parameters
    }

    pub fn num_lookup_parameters(&self) -> usize {
        self.num_lookup_parameters
    }

    pub fn to_snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            num_parameters: self.num_parameters,
            num_lookup_parameters: self.num_lookup_parameters,
            parameters: self
                .parameters
                .iter()
                .map(|p| DenseState {
                    dim: p.dim,
                    values: p.values.clone(),
                })
                .collect(),
            lookup_parameters: self
                .lookup_parameters
                .iter()
                .map(|p| LookupState {
                    dim: p.dim,
                    values: p.values.to_vec(),
                })
                .collect(),
        }
    }
}

impl Model {
    /// Borrows the values of every parameter for persisting
    pub fn snapshot(&self) -> ModelSnapshotRef<'_> {
        ModelSnapshotRef {
            num_parameters: self.num_parameters(),
            num_lookup_parameters: self.num_lookup_parameters(),
            parameters: self
                .parameters()
                .map(|p| DenseStateRef {
                    dim: p.dim(),
                    values: p.values(),
                })
                .collect(),
            lookup_parameters: self
                .lookup_parameters()
                .map(|p| LookupStateRef {
                    dim: p.dim(),
                    values: p.values(),
                })
                .collect(),
        }
    }

    /// Overwrites the values of existing parameters with `snapshot`.
    ///
    /// The model must have been built with the same sequence of `add_*`
    /// calls as the one the snapshot was taken from: parameter counts,
    /// shapes and table lengths must all match. Everything is checked
    /// before anything is written, so on error no value has changed.
    /// Gradients are left as they are.
    pub fn restore(&mut self, snapshot: ModelSnapshot) -> Result<(), ModelError> {
        if let Err(e) = self.check_snapshot(&snapshot) {
            warn!(error = %e, "refusing to restore parameters");
            return Err(e);
        }

        for (p, state) in self.parameters_mut().zip(snapshot.parameters) {
            p.set_values(state.values)?;
        }
        for (p, state) in self.lookup_parameters_mut().zip(snapshot.lookup_parameters) {
            p.set_values(state.values)?;
        }
        Ok(())
    }

    /// Fails unless the model holds exactly this many parameters of each kind
    pub fn check_counts(
        &self,
        num_parameters: usize,
        num_lookup_parameters: usize,
    ) -> Result<(), ModelError> {
        if num_parameters != self.num_parameters()
            || num_lookup_parameters != self.num_lookup_parameters()
        {
            return Err(ModelError::StructureMismatch(format!(
                "saved model has {} parameters and {} lookup parameters, this model has {} and {}",
                num_parameters,
                num_lookup_parameters,
                self.num_parameters(),
                self.num_lookup_parameters()
            )));
        }
        Ok(())
    }

    fn check_snapshot(&self, snapshot: &ModelSnapshot) -> Result<(), ModelError> {
        self.check_counts(snapshot.num_parameters, snapshot.num_lookup_parameters)?;
        if snapshot.parameters.len() != snapshot.num_parameters
            || snapshot.lookup_parameters.len() != snapshot.num_lookup_parameters
        {
            return Err(ModelError::structure(
                "saved parameter lists disagree with their counts",
            ));
        }

        for (i, (p, state)) in self.parameters().zip(&snapshot.parameters).enumerate() {
            check_dense(p, state).map_err(|e| {
                ModelError::StructureMismatch(format!("parameters #{}: {}", i, e))
            })?;
        }
        for (i, (p, state)) in self
            .lookup_parameters()
            .zip(&snapshot.lookup_parameters)
            .enumerate()
        {
            check_lookup(p, state).map_err(|e| {
                ModelError::StructureMismatch(format!("lookup parameters #{}: {}", i, e))
            })?;
        }
        Ok(())
    }
}

fn check_dense(p: &Parameters, state: &DenseState) -> Result<(), ModelError> {
    ModelError::check_dim(p.dim(), state.dim)?;
    ModelError::check_dim(p.dim(), Dim::of(&state.values))
}

fn check_lookup(p: &LookupParameters, state: &LookupState) -> Result<(), ModelError> {
    ModelError::check_dim(p.dim(), state.dim)?;
    p.check_rows(&state.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InitConfig;
    use ndarray::array;

    fn build(seed: u64) -> Model {
        let mut model = Model::with_config(InitConfig::default().with_seed(seed)).unwrap();
        model.add_parameters(Dim::new(2, 3));
        model.add_lookup_parameters(4, Dim::vector(2));
        model.add_parameters(Dim::vector(3));
        model
    }

    #[test]
    fn test_snapshot_order_and_counts() {
        let model = build(1);
        let snapshot = model.snapshot().to_snapshot();
        assert_eq!(snapshot.num_parameters, 2);
        assert_eq!(snapshot.num_lookup_parameters, 1);
        assert_eq!(snapshot.parameters[0].dim, Dim::new(2, 3));
        assert_eq!(snapshot.parameters[1].dim, Dim::vector(3));
        assert_eq!(snapshot.lookup_parameters[0].values.len(), 4);
    }

    #[test]
    fn test_restore_copies_values_and_keeps_grads() {
        let source = build(1);
        let mut target = build(2);
        let grad = array![[1.0], [1.0], [1.0]];
        let b = target.parameters_mut().nth(1).unwrap();
        b.accumulate_grad(&grad).unwrap();

        target.restore(source.snapshot().to_snapshot()).unwrap();

        let src: Vec<_> = source.parameters().map(|p| p.values().clone()).collect();
        let dst: Vec<_> = target.parameters().map(|p| p.values().clone()).collect();
        assert_eq!(src, dst);
        assert_eq!(
            source.lookup_parameters().next().unwrap().values(),
            target.lookup_parameters().next().unwrap().values()
        );
        assert_eq!(target.parameters().nth(1).unwrap().grad(), &grad);
    }

    #[test]
    fn test_restore_count_mismatch_changes_nothing() {
        let source = build(1);
        let mut target = build(2);
        target.add_parameters(Dim::new(1, 1));
        let before = target.snapshot().to_snapshot();

        let err = target.restore(source.snapshot().to_snapshot()).unwrap_err();
        assert!(matches!(err, ModelError::StructureMismatch(_)));
        assert_eq!(target.snapshot().to_snapshot(), before);
    }

    #[test]
    fn test_restore_shape_mismatch_changes_nothing() {
        let source = build(1);
        let mut target = Model::with_config(InitConfig::default().with_seed(2)).unwrap();
        target.add_parameters(Dim::new(2, 3));
        target.add_lookup_parameters(4, Dim::vector(2));
        target.add_parameters(Dim::vector(4));
        let before = target.snapshot().to_snapshot();

        let err = target.restore(source.snapshot().to_snapshot()).unwrap_err();
        assert!(matches!(err, ModelError::StructureMismatch(_)));
        assert_eq!(target.snapshot().to_snapshot(), before);
    }

    #[test]
    fn test_restore_table_length_mismatch() {
        let source = build(1);
        let mut target = Model::with_config(InitConfig::default().with_seed(2)).unwrap();
        target.add_parameters(Dim::new(2, 3));
        target.add_lookup_parameters(5, Dim::vector(2));
        target.add_parameters(Dim::vector(3));
        let before = target.snapshot().to_snapshot();

        assert!(target.restore(source.snapshot().to_snapshot()).is_err());
        assert_eq!(target.snapshot().to_snapshot(), before);
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshot() {
        let mut target = build(2);
        let mut snapshot = build(1).snapshot().to_snapshot();
        snapshot.parameters[0].values = Array2::zeros((3, 2));
        assert!(target.restore(snapshot).is_err());

        let mut snapshot = build(1).snapshot().to_snapshot();
        snapshot.parameters.pop();
        assert!(target.restore(snapshot).is_err());
    }
}
