use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::advice::TextGenerator;
use super::domain::RawIntake;
use super::intake::FIELD_SPECS;
use super::service::{AssessmentError, AssessmentService};

/// Router builder exposing the assessment endpoints.
pub fn assessment_router<G>(service: Arc<AssessmentService<G>>) -> Router
where
    G: TextGenerator + 'static,
{
    Router::new()
        .route("/api/v1/assessments", post(assess_handler::<G>))
        .route("/api/v1/assessments/fields", get(fields_handler))
        .with_state(service)
}

/// Accepts string values as submitted by forms, and JSON scalars for convenience.
/// `null` is kept as an empty value so it is echoed back on rejection.
pub(crate) fn raw_intake_from_json(payload: BTreeMap<String, Value>) -> RawIntake {
    payload
        .into_iter()
        .map(|(key, value)| match value {
            Value::Null => (key, String::new()),
            Value::String(text) => (key, text),
            other => (key, other.to_string()),
        })
        .collect()
}

pub(crate) async fn assess_handler<G>(
    State(service): State<Arc<AssessmentService<G>>>,
    Json(payload): Json<BTreeMap<String, Value>>,
) -> Response
where
    G: TextGenerator + 'static,
{
    let raw = raw_intake_from_json(payload);
    match service.assess(raw).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(AssessmentError::Rejected(rejection)) => {
            let payload = json!({
                "error_message": rejection.error.message,
                "error_kind": rejection.error.kind,
                "field": rejection.error.field,
                "echoed_fields": rejection.echoed_fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn fields_handler() -> Json<Value> {
    Json(json!({ "fields": FIELD_SPECS }))
}
