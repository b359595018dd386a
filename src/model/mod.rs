//! Parameter registry for neural network models

mod config;
mod dim;
mod error;
mod init;
pub mod params;
mod snapshot;

pub use config::InitConfig;
pub use dim::Dim;
pub use error::ModelError;
pub use init::Initializer;
pub use params::{LookupParameters, ParameterEntity, Parameters};
pub use snapshot::{DenseState, LookupState, ModelSnapshot, ModelSnapshotRef};

use ndarray::Array2;
use tracing::{debug, warn};

use params::Entity;

/// Stable reference to dense parameters created by a [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DenseHandle(usize);

/// Stable reference to lookup parameters created by a [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupHandle(usize);

/// Owns every parameter of a model, in creation order.
///
/// If you need a matrix of parameters or a lookup table, ask a `Model` for
/// one and keep the returned handle. Parameters are never removed; they live
/// as long as the model does. Gradients are tracked by the parameters
/// themselves; any extra optimizer state (momentum, moments) lives with the
/// optimizer.
#[derive(Debug, Clone)]
pub struct Model {
    entities: Vec<Entity>,
    num_dense: usize,
    num_lookup: usize,
    init: Initializer,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates an empty model that initializes parameters from N(0, 0.02)
    pub fn new() -> Self {
        Self::with_initializer(Initializer::default())
    }

    pub fn with_config(config: InitConfig) -> Result<Self, ModelError> {
        Ok(Self::with_initializer(Initializer::new(&config)?))
    }

    pub fn with_initializer(init: Initializer) -> Self {
        Self {
            entities: Vec::new(),
            num_dense: 0,
            num_lookup: 0,
            init,
        }
    }

    /// Adds randomly initialized dense parameters of shape `dim`
    pub fn add_parameters(&mut self, dim: Dim) -> DenseHandle {
        let values = self.init.random(dim);
        self.push_dense(Parameters::from_values(values))
    }

    /// Adds dense parameters whose initial value is exactly `values`
    pub fn add_parameters_from(&mut self, values: Array2<f32>) -> DenseHandle {
        self.push_dense(Parameters::from_values(values))
    }

    /// Adds a table of `n` randomly initialized rows of shape `dim`
    pub fn add_lookup_parameters(&mut self, n: usize, dim: Dim) -> LookupHandle {
        let rows = (0..n).map(|_| self.init.random(dim)).collect();
        let index = self.entities.len();
        self.entities
            .push(Entity::Lookup(LookupParameters::from_rows(dim, rows)));
        self.num_lookup += 1;
        debug!(index, rows = n, dim = %dim, "added lookup parameters");
        LookupHandle(index)
    }

    fn push_dense(&mut self, params: Parameters) -> DenseHandle {
        let index = self.entities.len();
        let dim = params.dim();
        self.entities.push(Entity::Dense(params));
        self.num_dense += 1;
        debug!(index, dim = %dim, "added parameters");
        DenseHandle(index)
    }

    /// Panics if `handle` was issued by a different model
    pub fn dense(&self, handle: DenseHandle) -> &Parameters {
        match &self.entities[handle.0] {
            Entity::Dense(p) => p,
            Entity::Lookup(_) => panic!("{:?} does not refer to dense parameters", handle),
        }
    }

    pub fn dense_mut(&mut self, handle: DenseHandle) -> &mut Parameters {
        match &mut self.entities[handle.0] {
            Entity::Dense(p) => p,
            Entity::Lookup(_) => panic!("{:?} does not refer to dense parameters", handle),
        }
    }

    pub fn lookup(&self, handle: LookupHandle) -> &LookupParameters {
        match &self.entities[handle.0] {
            Entity::Lookup(p) => p,
            Entity::Dense(_) => panic!("{:?} does not refer to lookup parameters", handle),
        }
    }

    pub fn lookup_mut(&mut self, handle: LookupHandle) -> &mut LookupParameters {
        match &mut self.entities[handle.0] {
            Entity::Lookup(p) => p,
            Entity::Dense(_) => panic!("{:?} does not refer to lookup parameters", handle),
        }
    }

    /// Every parameter, dense and lookup, in creation order
    pub fn all_parameters(&self) -> impl Iterator<Item = &dyn ParameterEntity> + '_ {
        self.entities.iter().map(Entity::as_entity)
    }

    pub fn all_parameters_mut(&mut self) -> impl Iterator<Item = &mut dyn ParameterEntity> + '_ {
        self.entities.iter_mut().map(Entity::as_entity_mut)
    }

    /// Dense parameters in creation order
    pub fn parameters(&self) -> impl Iterator<Item = &Parameters> + '_ {
        self.entities.iter().filter_map(Entity::as_dense)
    }

    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut Parameters> + '_ {
        self.entities.iter_mut().filter_map(Entity::as_dense_mut)
    }

    /// Lookup parameters in creation order
    pub fn lookup_parameters(&self) -> impl Iterator<Item = &LookupParameters> + '_ {
        self.entities.iter().filter_map(Entity::as_lookup)
    }

    pub fn lookup_parameters_mut(&mut self) -> impl Iterator<Item = &mut LookupParameters> + '_ {
        self.entities.iter_mut().filter_map(Entity::as_lookup_mut)
    }

    pub fn num_parameters(&self) -> usize {
        self.num_dense
    }

    pub fn num_lookup_parameters(&self) -> usize {
        self.num_lookup
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of scalar values across all parameters
    pub fn total_size(&self) -> usize {
        self.all_parameters().map(|p| p.size()).sum()
    }

    /// Squared L2 norm of the gradient across all parameters
    pub fn grad_squared_l2norm(&self) -> f32 {
        self.all_parameters().map(|p| p.grad_squared_l2norm()).sum()
    }

    pub fn rescale_gradients(&mut self, scale: f32) {
        for p in self.all_parameters_mut() {
            p.rescale_gradient(scale);
        }
    }

    /// Rescales all gradients so their global L2 norm is at most `threshold`.
    /// Returns the norm before clipping. A threshold that is not a positive
    /// finite number leaves the gradients untouched.
    pub fn clip_gradients(&mut self, threshold: f32) -> f32 {
        let norm = self.grad_squared_l2norm().sqrt();
        if !(threshold.is_finite() && threshold > 0.0) {
            warn!(threshold, "ignoring invalid gradient clipping threshold");
            return norm;
        }
        if norm > threshold {
            let scale = threshold / norm;
            debug!(norm, threshold, scale, "clipping gradients");
            self.rescale_gradients(scale);
        }
        norm
    }

    pub fn clear_gradients(&mut self) {
        for p in self.all_parameters_mut() {
            p.clear();
        }
    }
}
