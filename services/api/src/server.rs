use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_assessment_routes;
use apnea_risk::assessment::{AdviceGenerator, AssessmentService, GeminiClient, RiskClassifier};
use apnea_risk::config::{AdviceConfig, AppConfig};
use apnea_risk::error::AppError;
use apnea_risk::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.model.take() {
        config.model.path = path;
    }
    if let Some(policy) = args.policy.take() {
        config.assessment.policy = policy;
    }

    telemetry::init(&config.telemetry)?;

    let classifier = RiskClassifier::from_artifact(&config.model.path)?;
    info!(path = %config.model.path.display(), "risk model loaded");

    let advice = advice_generator(&config.advice);
    let service = Arc::new(AssessmentService::with_advice(
        classifier,
        config.assessment.policy,
        advice,
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_assessment_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        policy = %config.assessment.policy,
        "sleep apnea risk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Advice is optional: a missing key or unusable client leaves it disabled.
fn advice_generator(config: &AdviceConfig) -> Option<AdviceGenerator<GeminiClient>> {
    match GeminiClient::from_config(config) {
        Ok(Some(client)) => {
            info!(endpoint = client.endpoint(), "advice generation enabled");
            Some(AdviceGenerator::from_config(Arc::new(client), config))
        }
        Ok(None) => {
            info!("GEMINI_API_KEY not set, advice generation disabled");
            None
        }
        Err(err) => {
            warn!(error = %err, "advice client unavailable, continuing without advice");
            None
        }
    }
}
