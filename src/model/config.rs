use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// Configuration for random initialization of new parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitConfig {
    #[serde(default = "default_mean")]
    pub mean: f32,
    #[serde(default = "default_std_dev")]
    pub std_dev: f32,
    /// Fixed RNG seed; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default values for optional fields
fn default_mean() -> f32 { 0.0 }
fn default_std_dev() -> f32 { 0.02 }

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            mean: default_mean(),
            std_dev: default_std_dev(),
            seed: None,
        }
    }
}

impl InitConfig {
    pub fn with_mean(mut self, mean: f32) -> Self {
        self.mean = mean;
        self
    }

    pub fn with_std_dev(mut self, std_dev: f32) -> Self {
        self.std_dev = std_dev;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.mean.is_finite() {
            return Err(ModelError::InitializationError(format!(
                "mean must be finite, got {}",
                self.mean
            )));
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return Err(ModelError::InitializationError(format!(
                "std_dev must be finite and non-negative, got {}",
                self.std_dev
            )));
        }
        Ok(())
    }
}
