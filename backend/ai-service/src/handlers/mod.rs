//! HTTP surface of the service
//!
//! Operational routes are public; everything under `/ai` sits behind the
//! bearer token gate.

pub mod analysis;
pub mod health;

use crate::error::OrchestrationError;
use crate::metrics::serve_metrics;
use crate::middleware::JwtAuth;
use crate::validation::ValidationError;
use actix_web::{error::JsonPayloadError, web};

/// Upper bound on analysis request bodies
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig, auth: JwtAuth) {
    cfg.route("/", web::get().to(health::root))
        .route("/health", web::get().to(health::health))
        .route("/ready", web::get().to(health::ready))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/ai")
                .wrap(auth)
                .app_data(json_config())
                .route("/analyze", web::post().to(analysis::analyze))
                .route("/trend-prediction", web::post().to(analysis::predict_trend))
                .route("/sentiment-analysis", web::post().to(analysis::analyze_sentiment))
                .route("/sales-forecast", web::post().to(analysis::forecast_sales)),
        );
}

/// Body extraction failures surface as validation errors
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected unreadable request body");

            let expected = match err {
                JsonPayloadError::ContentType => "sent as application/json",
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    "within the request size limit"
                }
                _ => "valid JSON",
            };

            OrchestrationError::from(ValidationError::TypeMismatch {
                field: "request".to_string(),
                expected,
            })
            .into()
        })
}
