use actix_web::{web, App, HttpServer};
use ai_service::config::Config;
use ai_service::handlers;
use ai_service::middleware::{JwtAuth, MetricsMiddleware, RequestLogging};
use ai_service::{AppState, CapabilityRegistry, Orchestrator, RequestValidator};
use anyhow::{Context, Result};
use resilience::IsolatedRuntime;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(&config);
    info!("Starting {}", config.service_name);

    config
        .validate()
        .context("Configuration validation failed")?;
    info!("Configuration loaded and validated");

    let registry = CapabilityRegistry::with_mock_predictors(&config.predictor_settings())
        .context("Failed to build capability registry")?;
    info!(kinds = ?registry.kinds(), "Capability registry initialized");

    let predictor_runtime = IsolatedRuntime::new("predictor", config.predictor_threads)
        .context("Failed to start predictor runtime")?;

    let orchestrator = Arc::new(Orchestrator::new(
        RequestValidator::new(config.max_series_len),
        Arc::new(registry),
        Arc::new(predictor_runtime),
    ));

    let state = web::Data::new(AppState::new(orchestrator, config.service_name.clone()));
    let auth = JwtAuth::new(&config.jwt_secret);

    let bind_address = config.bind_address();
    info!("Starting HTTP server on {}", bind_address);

    HttpServer::new(move || {
        let auth = auth.clone();
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(RequestLogging)
            .configure(|cfg| handlers::configure(cfg, auth))
    })
    .workers(config.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind HTTP server to {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("{} shut down", config.service_name);
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},actix_web=info", config.log_level).into());

    if config.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
