//! Sleep apnea risk assessment pipeline.
//!
//! Raw intake is validated, encoded into the canonical nine-feature vector, scored
//! by the loaded classifier, and mapped to a risk category by a threshold policy.
//! Advice from a generative text service is optional and never fails the pipeline.

pub mod advice;
pub mod batch;
pub mod category;
pub mod classifier;
pub mod domain;
pub mod features;
pub mod intake;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use advice::{build_prompt, AdviceError, AdviceGenerator, GeminiClient, TextGenerator};
pub use batch::{BatchImportError, IntakeBatch};
pub use category::{RiskCategory, RiskProbability, ThresholdPolicy, UnknownPolicy};
pub use classifier::{FeedForwardNetwork, InferenceError, ModelLoadError, RiskClassifier, RiskModel};
pub use domain::{FeatureVector, IntakeField, IntakeRecord, RawIntake, Sex, FEATURE_COUNT};
pub use features::encode;
pub use intake::{
    FieldConstraint, FieldSpec, IntakeErrorKind, IntakeRejection, IntakeValidationError,
    IntakeValidator, FIELD_SPECS,
};
pub use router::assessment_router;
pub use service::{AssessmentError, AssessmentResult, AssessmentService, Evaluation, DISCLAIMER};
