pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod orchestrator;
pub mod predictors;
pub mod registry;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

// Re-export common types
pub use error::{AuthError, ErrorEnvelope, OrchestrationError};
pub use models::{AnalysisKind, AnalyticalRequest, AnalyticalResult, AuthContext, PredictionBody};
pub use orchestrator::Orchestrator;
pub use predictors::Predictor;
pub use registry::{CapabilityRegistry, PredictorDescriptor, PredictorSettings, RegistryError};
pub use resilience::IsolatedRuntime;
pub use validation::{RequestValidator, ValidationError};

/// Shared state handed to every HTTP worker
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub service_name: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, service_name: impl Into<String>) -> Self {
        Self {
            orchestrator,
            service_name: service_name.into(),
            started_at: Instant::now(),
        }
    }
}
