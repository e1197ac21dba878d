mod network;

pub use network::{Activation, FeedForwardNetwork, ModelLoadError};

use std::path::Path;
use std::sync::Arc;

use super::category::RiskProbability;
use super::domain::FeatureVector;

/// Capability implemented by any loaded predictive model.
///
/// Implementations are read-only after construction and shared across requests.
pub trait RiskModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError>;
}

/// Unexpected failure while scoring a well-formed feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("model expected {expected} features but received {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("model produced a non-finite activation at layer {layer}")]
    NonFinite { layer: usize },
    #[error("model produced probability {value} outside [0, 1]")]
    OutOfRange { value: f64 },
    #[error("model backend failure: {0}")]
    Backend(String),
}

/// Probability-producing wrapper around an injected, immutable model handle.
#[derive(Clone)]
pub struct RiskClassifier {
    model: Arc<dyn RiskModel>,
}

impl RiskClassifier {
    pub fn new(model: Arc<dyn RiskModel>) -> Self {
        Self { model }
    }

    /// Load the serialized network from disk. Failure here is fatal to startup.
    pub fn from_artifact<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let network = FeedForwardNetwork::load(path)?;
        Ok(Self::new(Arc::new(network)))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<RiskProbability, InferenceError> {
        let raw = self.model.predict(features)?;
        RiskProbability::new(raw).ok_or(InferenceError::OutOfRange { value: raw })
    }
}

impl std::fmt::Debug for RiskClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskClassifier").finish_non_exhaustive()
    }
}
