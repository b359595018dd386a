use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use super::config::InitConfig;
use super::error::ModelError;
use super::Dim;

/// Draws initial parameter values from a normal distribution
#[derive(Debug, Clone)]
pub struct Initializer {
    rng: StdRng,
    normal: Normal<f32>,
}

impl Initializer {
    pub fn new(config: &InitConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let normal = Normal::new(config.mean, config.std_dev).map_err(|e| {
            ModelError::InitializationError(e.to_string())
        })?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self { rng, normal })
    }

    pub fn random(&mut self, dim: Dim) -> Array2<f32> {
        Array2::from_shape_fn(dim.as_tuple(), |_| self.normal.sample(&mut self.rng))
    }
}

impl Default for Initializer {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            normal: Normal::new(0.0, 0.02).expect("default distribution is valid"),
        }
    }
}
