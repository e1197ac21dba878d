use serde::Serialize;
use tracing::{debug, error, info};

use super::advice::{AdviceGenerator, GeminiClient, TextGenerator};
use super::category::{RiskCategory, RiskProbability, ThresholdPolicy};
use super::classifier::{InferenceError, RiskClassifier};
use super::domain::{FeatureVector, IntakeRecord, RawIntake};
use super::features;
use super::intake::{IntakeRejection, IntakeValidator};

/// Notice shown alongside every result.
pub const DISCLAIMER: &str =
    "Please consult with a healthcare professional for a comprehensive evaluation.";

/// Deterministic part of an assessment, before any advice is requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub record: IntakeRecord,
    pub features: FeatureVector,
    pub probability: RiskProbability,
    pub policy: ThresholdPolicy,
    pub category: RiskCategory,
}

/// Payload delivered to callers on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub risk_category: RiskCategory,
    pub risk_label: &'static str,
    pub policy: ThresholdPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice_text: Option<String>,
    pub disclaimer: &'static str,
}

impl AssessmentResult {
    fn new(evaluation: &Evaluation, advice_text: Option<String>) -> Self {
        Self {
            risk_category: evaluation.category,
            risk_label: evaluation.category.label(),
            policy: evaluation.policy,
            advice_text,
            disclaimer: DISCLAIMER,
        }
    }
}

/// Error raised by the assessment pipeline. Advice failures never appear here.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Rejected(#[from] IntakeRejection),
    #[error("unable to score assessment: {0}")]
    Inference(#[from] InferenceError),
}

/// Sequences validation, encoding, classification, categorization, and advice.
pub struct AssessmentService<G = GeminiClient> {
    validator: IntakeValidator,
    classifier: RiskClassifier,
    policy: ThresholdPolicy,
    advice: Option<AdviceGenerator<G>>,
}

impl AssessmentService {
    /// Service without advice augmentation.
    pub fn new(classifier: RiskClassifier, policy: ThresholdPolicy) -> Self {
        Self {
            validator: IntakeValidator::new(),
            classifier,
            policy,
            advice: None,
        }
    }
}

impl<G> AssessmentService<G>
where
    G: TextGenerator + 'static,
{
    pub fn with_advice(
        classifier: RiskClassifier,
        policy: ThresholdPolicy,
        advice: Option<AdviceGenerator<G>>,
    ) -> Self {
        Self {
            validator: IntakeValidator::new(),
            classifier,
            policy,
            advice,
        }
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    pub fn advice_enabled(&self) -> bool {
        self.advice.is_some()
    }

    /// Run the numeric pipeline only.
    pub fn evaluate(&self, raw: RawIntake) -> Result<Evaluation, AssessmentError> {
        let record = match self.validator.validate_or_reject(raw) {
            Ok(record) => record,
            Err(rejection) => {
                info!(
                    field = %rejection.error.field,
                    kind = rejection.error.kind.label(),
                    "assessment intake rejected"
                );
                return Err(rejection.into());
            }
        };
        debug!("intake validated");

        let features = features::encode(&record);
        debug!("features encoded");

        let probability = self.classifier.predict(&features).map_err(|err| {
            error!(error = %err, "classifier inference failed");
            err
        })?;
        debug!(probability = probability.value(), "features classified");

        let category = self.policy.categorize(probability);
        debug!(%category, policy = %self.policy, "probability categorized");

        Ok(Evaluation {
            record,
            features,
            probability,
            policy: self.policy,
            category,
        })
    }

    /// Run the full pipeline, attaching advice when the augmentation is enabled.
    pub async fn assess(&self, raw: RawIntake) -> Result<AssessmentResult, AssessmentError> {
        let evaluation = self.evaluate(raw)?;

        let advice_text = match &self.advice {
            Some(advice) => advice.advise(evaluation.category).await,
            None => None,
        };

        info!(
            category = %evaluation.category,
            policy = %evaluation.policy,
            advised = advice_text.is_some(),
            "assessment delivered"
        );

        Ok(AssessmentResult::new(&evaluation, advice_text))
    }
}

impl<G> std::fmt::Debug for AssessmentService<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentService")
            .field("classifier", &self.classifier)
            .field("policy", &self.policy)
            .field("advice_enabled", &self.advice.is_some())
            .finish()
    }
}
