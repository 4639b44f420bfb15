use crate::error::OrchestrationError;
use crate::middleware::CorrelationId;
use crate::models::{AnalysisKind, AuthContext};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde_json::Value;
use tracing::Instrument;

/// Run any analysis; the kind is read from the body
/// POST /ai/analyze
pub async fn analyze(
    state: web::Data<AppState>,
    auth: AuthContext,
    correlation_id: CorrelationId,
    body: web::Json<Value>,
) -> Result<HttpResponse, OrchestrationError> {
    run(&state, &auth, &correlation_id, body.into_inner()).await
}

/// POST /ai/trend-prediction
pub async fn predict_trend(
    state: web::Data<AppState>,
    auth: AuthContext,
    correlation_id: CorrelationId,
    body: web::Json<Value>,
) -> Result<HttpResponse, OrchestrationError> {
    let raw = with_kind(body.into_inner(), AnalysisKind::Trend);
    run(&state, &auth, &correlation_id, raw).await
}

/// POST /ai/sentiment-analysis
pub async fn analyze_sentiment(
    state: web::Data<AppState>,
    auth: AuthContext,
    correlation_id: CorrelationId,
    body: web::Json<Value>,
) -> Result<HttpResponse, OrchestrationError> {
    let raw = with_kind(body.into_inner(), AnalysisKind::Sentiment);
    run(&state, &auth, &correlation_id, raw).await
}

/// POST /ai/sales-forecast
pub async fn forecast_sales(
    state: web::Data<AppState>,
    auth: AuthContext,
    correlation_id: CorrelationId,
    body: web::Json<Value>,
) -> Result<HttpResponse, OrchestrationError> {
    let raw = with_kind(body.into_inner(), AnalysisKind::Forecast);
    run(&state, &auth, &correlation_id, raw).await
}

async fn run(
    state: &AppState,
    auth: &AuthContext,
    correlation_id: &CorrelationId,
    raw: Value,
) -> Result<HttpResponse, OrchestrationError> {
    let span = tracing::info_span!("analysis", correlation_id = %correlation_id.as_str());

    let result = state
        .orchestrator
        .handle(&raw, auth)
        .instrument(span)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// The route fixes the kind; anything the caller put in `kind` is replaced.
/// Non-object bodies are left alone for the validator to reject.
fn with_kind(mut raw: Value, kind: AnalysisKind) -> Value {
    if let Some(object) = raw.as_object_mut() {
        object.insert("kind".to_string(), Value::from(kind.as_str()));
    }
    raw
}
