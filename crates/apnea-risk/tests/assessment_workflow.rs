use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use apnea_risk::assessment::{
    assessment_router, encode, AdviceError, AdviceGenerator, AssessmentError, AssessmentService,
    FeedForwardNetwork, IntakeBatch, IntakeErrorKind, IntakeValidator, ModelLoadError, RawIntake,
    RiskCategory, RiskClassifier, TextGenerator, ThresholdPolicy, DISCLAIMER,
};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tempfile::NamedTempFile;
use tower::ServiceExt;

const DEMO_MODEL: &str = include_str!("../../../models/sleep_apnea_model.json");

fn reference_intake() -> RawIntake {
    [
        ("age", "45"),
        ("sex", "male"),
        ("waist_hip_ratio", "0.95"),
        ("active_smoking", "no"),
        ("passive_smoking", "no"),
        ("alcohol", "2"),
        ("physical_activity", "7"),
        ("diet_quality", "8"),
        ("mental_health", "5"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

fn write_artifact(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp artifact");
    file.write_all(contents.as_bytes()).expect("write artifact");
    file
}

fn demo_classifier() -> RiskClassifier {
    let artifact = write_artifact(DEMO_MODEL);
    RiskClassifier::from_artifact(artifact.path()).expect("demo model loads")
}

struct CannedAdvice;

impl TextGenerator for CannedAdvice {
    async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
        assert!(prompt.contains("sleep apnea"));
        Ok("  Small changes to daily routines can help.  ".to_string())
    }
}

struct UnavailableAdvice;

impl TextGenerator for UnavailableAdvice {
    async fn generate(&self, _prompt: &str) -> Result<String, AdviceError> {
        Err(AdviceError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

#[test]
fn demo_artifact_scores_reference_intake_deterministically() {
    let classifier = demo_classifier();
    let record = IntakeValidator::new()
        .validate(&reference_intake())
        .expect("reference intake is valid");
    let features = encode(&record);

    let first = classifier.predict(&features).expect("inference succeeds");
    let second = classifier.predict(&features).expect("inference succeeds");

    assert_eq!(first, second);
    assert!((0.0..=1.0).contains(&first.value()));
}

#[test]
fn network_loader_rejects_artifact_without_sigmoid_output() {
    let artifact = write_artifact(
        r#"{
            "input_dim": 9,
            "layers": [
                { "type": "dense", "activation": "relu",
                  "weights": [[0, 0, 0, 0, 0, 0, 0, 0, 0]], "bias": [0] }
            ]
        }"#,
    );

    match FeedForwardNetwork::load(artifact.path()) {
        Err(ModelLoadError::Shape(message)) => assert!(message.contains("sigmoid")),
        other => panic!("expected shape error, got {other:?}"),
    }
}

#[test]
fn missing_artifact_is_reported_with_its_path() {
    let error = RiskClassifier::from_artifact("./models/absent.json").expect_err("missing file");
    assert!(error.to_string().contains("absent.json"));
}

#[test]
fn policies_agree_outside_the_boundary_band() {
    let wide = AssessmentService::new(demo_classifier(), ThresholdPolicy::WideMiddle);
    let even = AssessmentService::new(demo_classifier(), ThresholdPolicy::EvenSplit);

    let wide_eval = wide.evaluate(reference_intake()).expect("evaluates");
    let even_eval = even.evaluate(reference_intake()).expect("evaluates");

    assert_eq!(wide_eval.probability, even_eval.probability);
    assert!(wide_eval.probability.value() < 0.30);
    assert_eq!(wide_eval.category, RiskCategory::Low);
    assert_eq!(
        wide_eval.category,
        ThresholdPolicy::WideMiddle.categorize(wide_eval.probability)
    );
    assert_eq!(
        even_eval.category,
        ThresholdPolicy::EvenSplit.categorize(even_eval.probability)
    );
}

#[test]
fn out_of_range_age_is_rejected_before_scoring() {
    let service = AssessmentService::new(demo_classifier(), ThresholdPolicy::WideMiddle);
    let mut intake = reference_intake();
    intake.insert("age".to_string(), "25".to_string());

    match service.evaluate(intake) {
        Err(AssessmentError::Rejected(rejection)) => {
            assert_eq!(rejection.error.kind, IntakeErrorKind::RangeError);
            assert_eq!(rejection.error.message, "Age must be between 30 and 70");
            assert_eq!(
                rejection.echoed_fields.get("age").map(String::as_str),
                Some("25")
            );
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn advised_assessment_returns_trimmed_narrative() {
    let advice = AdviceGenerator::new(
        Arc::new(CannedAdvice),
        Duration::from_millis(200),
        None,
    );
    let service = AssessmentService::with_advice(
        demo_classifier(),
        ThresholdPolicy::WideMiddle,
        Some(advice),
    );

    let result = service.assess(reference_intake()).await.expect("assessed");

    assert_eq!(
        result.advice_text.as_deref(),
        Some("Small changes to daily routines can help.")
    );
    assert_eq!(result.disclaimer, DISCLAIMER);
    assert_eq!(result.risk_label, result.risk_category.label());
}

#[tokio::test]
async fn unavailable_advice_service_degrades_to_category_only() {
    let advice = AdviceGenerator::new(
        Arc::new(UnavailableAdvice),
        Duration::from_millis(200),
        Some(Duration::from_millis(1)),
    );
    let service = AssessmentService::with_advice(
        demo_classifier(),
        ThresholdPolicy::EvenSplit,
        Some(advice),
    );

    let result = service.assess(reference_intake()).await.expect("assessed");

    assert!(result.advice_text.is_none());
    assert_eq!(result.risk_category, RiskCategory::Low);
}

#[test]
fn batch_rows_flow_through_the_pipeline() {
    let mut csv = NamedTempFile::new().expect("temp csv");
    writeln!(
        csv,
        "age,sex,waist_hip_ratio,active_smoking,passive_smoking,alcohol,physical_activity,diet_quality,mental_health"
    )
    .expect("write header");
    writeln!(csv, "45,male,0.95,no,no,2,7,8,5").expect("write row");
    writeln!(csv, "63,1,1.12,1,1,9,1,3,16.5").expect("write row");
    writeln!(csv, "29,female,0.80,no,no,1,5,5,4").expect("write row");

    let rows = IntakeBatch::from_path(csv.path()).expect("batch reads");
    let service = AssessmentService::new(demo_classifier(), ThresholdPolicy::WideMiddle);
    let outcomes: Vec<_> = rows.into_iter().map(|row| service.evaluate(row)).collect();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(matches!(outcomes[2], Err(AssessmentError::Rejected(_))));
}

#[tokio::test]
async fn router_serves_demo_model_assessments() {
    let service = Arc::new(AssessmentService::new(
        demo_classifier(),
        ThresholdPolicy::WideMiddle,
    ));
    let router = assessment_router(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/assessments")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&reference_intake()).expect("serialize intake"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(payload["risk_category"], "low");
    assert_eq!(payload["policy"], "wide-middle");
    assert_eq!(payload["disclaimer"], DISCLAIMER);
}
