//! Parameter entities owned by a [`Model`](crate::Model).
//!
//! To deal with sparse updates there are two kinds of parameters:
//! * [`Parameters`] hold a weight matrix. They are densely updated.
//! * [`LookupParameters`] hold a table of row embeddings for a set of
//!   discrete objects. Only the rows touched by a computation receive a
//!   gradient, so they are sparsely updated.

mod dense;
mod lookup;

pub use dense::Parameters;
pub use lookup::LookupParameters;

use super::Dim;

/// Operations an optimizer needs on every parameter, independent of its kind
pub trait ParameterEntity {
    /// Shape of the values (of a single row, for lookup tables)
    fn dim(&self) -> Dim;

    /// Total number of scalar values held
    fn size(&self) -> usize;

    /// Multiply the accumulated gradient by `scale` in place
    fn rescale_gradient(&mut self, scale: f32);

    /// Sum of squares over the accumulated gradient
    fn grad_squared_l2norm(&self) -> f32;

    /// Discard the accumulated gradient
    fn clear(&mut self);
}

/// A parameter of either kind, in the order it was added to the model
#[derive(Debug, Clone)]
pub(crate) enum Entity {
    Dense(Parameters),
    Lookup(LookupParameters),
}

impl Entity {
    pub(crate) fn as_entity(&self) -> &dyn ParameterEntity {
        match self {
            Entity::Dense(p) => p,
            Entity::Lookup(p) => p,
        }
    }

    pub(crate) fn as_entity_mut(&mut self) -> &mut dyn ParameterEntity {
        match self {
            Entity::Dense(p) => p,
            Entity::Lookup(p) => p,
        }
    }

    pub(crate) fn as_dense(&self) -> Option<&Parameters> {
        match self {
            Entity::Dense(p) => Some(p),
            Entity::Lookup(_) => None,
        }
    }

    pub(crate) fn as_dense_mut(&mut self) -> Option<&mut Parameters> {
        match self {
            Entity::Dense(p) => Some(p),
            Entity::Lookup(_) => None,
        }
    }

    pub(crate) fn as_lookup(&self) -> Option<&LookupParameters> {
        match self {
            Entity::Lookup(p) => Some(p),
            Entity::Dense(_) => None,
        }
    }

    pub(crate) fn as_lookup_mut(&mut self) -> Option<&mut LookupParameters> {
        match self {
            Entity::Lookup(p) => Some(p),
            Entity::Dense(_) => None,
        }
    }
}
