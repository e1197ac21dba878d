use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{InferenceError, RiskModel};
use crate::assessment::domain::{FeatureVector, FEATURE_COUNT};

const DEFAULT_BATCH_NORM_EPSILON: f64 = 1e-3;

/// Failure to read or accept a serialized classifier artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("unable to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model artifact has an invalid shape: {0}")]
    Shape(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    input_dim: usize,
    layers: Vec<LayerSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LayerSpec {
    Dense {
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        activation: Activation,
    },
    BatchNormalization {
        gamma: Vec<f64>,
        beta: Vec<f64>,
        moving_mean: Vec<f64>,
        moving_variance: Vec<f64>,
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
    Dropout {
        #[serde(default)]
        #[allow(dead_code)]
        rate: f64,
    },
}

fn default_epsilon() -> f64 {
    DEFAULT_BATCH_NORM_EPSILON
}

#[derive(Debug, Clone)]
enum Layer {
    Dense {
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        activation: Activation,
    },
    /// Batch normalization folded into a per-unit affine transform.
    Affine { scale: Vec<f64>, shift: Vec<f64> },
}

impl Layer {
    fn apply(&self, input: &[f64]) -> Vec<f64> {
        match self {
            Layer::Dense {
                weights,
                bias,
                activation,
            } => weights
                .iter()
                .zip(bias)
                .map(|(row, b)| {
                    let sum: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                    activation.apply(sum + b)
                })
                .collect(),
            Layer::Affine { scale, shift } => input
                .iter()
                .zip(scale.iter().zip(shift))
                .map(|(x, (s, t))| x * s + t)
                .collect(),
        }
    }
}

/// Feed-forward binary classifier evaluated in inference mode.
///
/// Dropout layers are dropped at load time and batch normalization uses the
/// stored moving statistics, so a loaded network is a pure function of its input.
#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    input_dim: usize,
    layers: Vec<Layer>,
}

impl FeedForwardNetwork {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        if artifact.input_dim != FEATURE_COUNT {
            return Err(shape(format!(
                "expected {FEATURE_COUNT} inputs, artifact declares {}",
                artifact.input_dim
            )));
        }

        let mut width = artifact.input_dim;
        let mut layers = Vec::with_capacity(artifact.layers.len());
        let mut final_activation = None;

        for (index, spec) in artifact.layers.into_iter().enumerate() {
            match spec {
                LayerSpec::Dense {
                    weights,
                    bias,
                    activation,
                } => {
                    if weights.is_empty() || weights.len() != bias.len() {
                        return Err(shape(format!(
                            "layer {index}: {} weight rows for {} biases",
                            weights.len(),
                            bias.len()
                        )));
                    }
                    if let Some(row) = weights.iter().position(|row| row.len() != width) {
                        return Err(shape(format!(
                            "layer {index}: weight row {row} does not match input width {width}"
                        )));
                    }
                    ensure_finite(index, weights.iter().flatten().chain(&bias))?;
                    width = bias.len();
                    final_activation = Some(activation);
                    layers.push(Layer::Dense {
                        weights,
                        bias,
                        activation,
                    });
                }
                LayerSpec::BatchNormalization {
                    gamma,
                    beta,
                    moving_mean,
                    moving_variance,
                    epsilon,
                } => {
                    if [&gamma, &beta, &moving_mean, &moving_variance]
                        .iter()
                        .any(|values| values.len() != width)
                    {
                        return Err(shape(format!(
                            "layer {index}: batch normalization parameters must have width {width}"
                        )));
                    }
                    ensure_finite(
                        index,
                        gamma
                            .iter()
                            .chain(&beta)
                            .chain(&moving_mean)
                            .chain(&moving_variance)
                            .chain(std::iter::once(&epsilon)),
                    )?;
                    let mut scale = Vec::with_capacity(width);
                    let mut shift = Vec::with_capacity(width);
                    for unit in 0..width {
                        let variance = moving_variance[unit] + epsilon;
                        if variance <= 0.0 {
                            return Err(shape(format!(
                                "layer {index}: non-positive variance for unit {unit}"
                            )));
                        }
                        let s = gamma[unit] / variance.sqrt();
                        scale.push(s);
                        shift.push(beta[unit] - moving_mean[unit] * s);
                    }
                    final_activation = None;
                    layers.push(Layer::Affine { scale, shift });
                }
                LayerSpec::Dropout { .. } => {}
            }
        }

        if width != 1 {
            return Err(shape(format!("expected a single output, found {width}")));
        }
        if final_activation != Some(Activation::Sigmoid) {
            return Err(shape("final layer must be a dense sigmoid unit".to_string()));
        }

        Ok(Self {
            input_dim: artifact.input_dim,
            layers,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn forward(&self, input: &[f64]) -> Result<f64, InferenceError> {
        if input.len() != self.input_dim {
            return Err(InferenceError::DimensionMismatch {
                expected: self.input_dim,
                found: input.len(),
            });
        }

        let mut activations = input.to_vec();
        for (index, layer) in self.layers.iter().enumerate() {
            activations = layer.apply(&activations);
            if activations.iter().any(|value| !value.is_finite()) {
                return Err(InferenceError::NonFinite { layer: index });
            }
        }

        activations
            .first()
            .copied()
            .ok_or(InferenceError::DimensionMismatch {
                expected: 1,
                found: 0,
            })
    }
}

impl RiskModel for FeedForwardNetwork {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        self.forward(features.as_slice())
    }
}

fn shape(message: String) -> ModelLoadError {
    ModelLoadError::Shape(message)
}

fn ensure_finite<'a>(
    index: usize,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), ModelLoadError> {
    if values.any(|value| !value.is_finite()) {
        return Err(shape(format!("layer {index}: parameters must be finite")));
    }
    Ok(())
}
