use crate::models::AnalysisKind;
use crate::AppState;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub kinds: Vec<AnalysisKind>,
}

/// GET /
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        message: "AI analytics service",
        version: VERSION,
        status: "running",
        timestamp: Utc::now(),
    })
}

/// GET /health
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: state.service_name.clone(),
        version: VERSION,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}

/// GET /ready
///
/// Not ready while no predictor is registered.
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    let kinds = state.orchestrator.registry().kinds();

    if kinds.is_empty() {
        return HttpResponse::ServiceUnavailable().json(ReadyResponse {
            status: "not_ready",
            kinds,
        });
    }

    HttpResponse::Ok().json(ReadyResponse {
        status: "ready",
        kinds,
    })
}
