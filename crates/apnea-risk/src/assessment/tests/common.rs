use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::assessment::advice::{AdviceError, AdviceGenerator, TextGenerator};
use crate::assessment::category::ThresholdPolicy;
use crate::assessment::classifier::{InferenceError, RiskClassifier, RiskModel};
use crate::assessment::domain::{FeatureVector, RawIntake};
use crate::assessment::service::AssessmentService;

pub(super) fn raw(pairs: &[(&str, &str)]) -> RawIntake {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Intake from the reference scenario: encodes to [45, 1, 0.95, 0, 0, 2, 7, 8, 5].
pub(super) fn reference_intake() -> RawIntake {
    raw(&[
        ("age", "45"),
        ("sex", "male"),
        ("waist_hip_ratio", "0.95"),
        ("active_smoking", "no"),
        ("passive_smoking", "no"),
        ("alcohol", "2"),
        ("physical_activity", "7"),
        ("diet_quality", "8"),
        ("mental_health", "5"),
    ])
}

pub(super) fn intake_with(field: &str, value: &str) -> RawIntake {
    let mut intake = reference_intake();
    intake.insert(field.to_string(), value.to_string());
    intake
}

pub(super) fn intake_without(field: &str) -> RawIntake {
    let mut intake = reference_intake();
    intake.remove(field);
    intake
}

/// Returns a fixed probability and records every vector it scores.
#[derive(Default)]
pub(super) struct FixedModel {
    probability: f64,
    calls: AtomicUsize,
    last_features: std::sync::Mutex<Option<FeatureVector>>,
}

impl FixedModel {
    pub(super) fn new(probability: f64) -> Arc<Self> {
        Arc::new(Self {
            probability,
            ..Self::default()
        })
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_features(&self) -> Option<FeatureVector> {
        *self.last_features.lock().expect("feature mutex poisoned")
    }
}

impl RiskModel for FixedModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_features.lock().expect("feature mutex poisoned") = Some(*features);
        Ok(self.probability)
    }
}

pub(super) struct FailingModel;

impl RiskModel for FailingModel {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, InferenceError> {
        Err(InferenceError::Backend("weights unavailable".to_string()))
    }
}

pub(super) struct FixedAdvice(pub(super) &'static str);

impl TextGenerator for FixedAdvice {
    async fn generate(&self, _prompt: &str) -> Result<String, AdviceError> {
        Ok(self.0.to_string())
    }
}

pub(super) struct StalledAdvice;

impl TextGenerator for StalledAdvice {
    async fn generate(&self, _prompt: &str) -> Result<String, AdviceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("unreachable".to_string())
    }
}

pub(super) fn classifier(model: Arc<dyn RiskModel>) -> RiskClassifier {
    RiskClassifier::new(model)
}

pub(super) fn plain_service(
    model: Arc<dyn RiskModel>,
    policy: ThresholdPolicy,
) -> AssessmentService {
    AssessmentService::new(classifier(model), policy)
}

pub(super) fn advised_service<G: TextGenerator + 'static>(
    model: Arc<dyn RiskModel>,
    policy: ThresholdPolicy,
    generator: G,
) -> AssessmentService<G> {
    let advice = AdviceGenerator::new(
        Arc::new(generator),
        Duration::from_millis(50),
        Some(Duration::from_millis(1)),
    );
    AssessmentService::with_advice(classifier(model), policy, Some(advice))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
