//! Prediction-request orchestration
//!
//! Each call to [`Orchestrator::handle`] walks the request through
//! `Received -> Validated -> Resolved -> Dispatched -> Completed`, or ends in
//! `Failed` at whichever stage raised the error. The orchestrator is the only
//! place where predictor failures are turned into [`OrchestrationError`]s.

use crate::error::OrchestrationError;
use crate::metrics;
use crate::models::{AnalysisKind, AnalyticalRequest, AnalyticalResult, AuthContext, Prediction};
use crate::registry::{CapabilityRegistry, PredictorDescriptor};
use crate::validation::RequestValidator;
use resilience::{with_deadline_on, with_retry, IsolatedRuntime, TimeoutError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Resolved,
    Dispatched,
    Completed,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Resolved => "resolved",
            Stage::Dispatched => "dispatched",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request state machine; lives only for the duration of one `handle` call
struct Transition {
    stage: Stage,
}

impl Transition {
    fn new() -> Self {
        Self {
            stage: Stage::Received,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "Orchestration stage transition");
        self.stage = next;
    }
}

pub struct Orchestrator {
    validator: RequestValidator,
    registry: Arc<CapabilityRegistry>,
    runtime: Arc<IsolatedRuntime>,
}

impl Orchestrator {
    /// Predictor calls run as tasks on `runtime`, never on the request
    /// worker, so a predictor that blocks its thread still times out on time.
    pub fn new(
        validator: RequestValidator,
        registry: Arc<CapabilityRegistry>,
        runtime: Arc<IsolatedRuntime>,
    ) -> Self {
        Self {
            validator,
            registry,
            runtime,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Validate, resolve and dispatch one raw request.
    ///
    /// The caller has already authenticated the request; `auth` is only used
    /// to attribute logs.
    #[instrument(skip(self, raw, auth), fields(subject = %auth.subject()))]
    pub async fn handle(
        &self,
        raw: &Value,
        auth: &AuthContext,
    ) -> Result<AnalyticalResult, OrchestrationError> {
        let started = Instant::now();
        let mut transition = Transition::new();

        let outcome = self.run(raw, &mut transition).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(result) => {
                metrics::record_analysis(result.kind().as_str(), "success", elapsed);
            }
            Err(err) => {
                let failed_at = transition.stage;
                transition.advance(Stage::Failed);
                debug!(stage = %failed_at, "Orchestration failed");
                err.log();

                let kind = err.kind().map(|k| k.as_str()).unwrap_or("unknown");
                metrics::record_analysis(kind, err.code(), elapsed);
            }
        }

        outcome
    }

    async fn run(
        &self,
        raw: &Value,
        transition: &mut Transition,
    ) -> Result<AnalyticalResult, OrchestrationError> {
        let request = self.validator.validate(raw)?;
        transition.advance(Stage::Validated);

        let kind = request.kind();
        let descriptor = self
            .registry
            .resolve(kind)
            .map_err(|_| OrchestrationError::UnsupportedKind(kind))?;
        transition.advance(Stage::Resolved);

        transition.advance(Stage::Dispatched);
        let prediction = dispatch(&self.runtime, descriptor, request.clone()).await?;

        let result = AnalyticalResult::success(&request, prediction, descriptor.handler().version());
        transition.advance(Stage::Completed);

        Ok(result)
    }
}

/// Invoke the predictor, honouring the descriptor's retry policy if any
async fn dispatch(
    runtime: &IsolatedRuntime,
    descriptor: &PredictorDescriptor,
    request: AnalyticalRequest,
) -> Result<Prediction, OrchestrationError> {
    let request = Arc::new(request);

    match descriptor.retry() {
        None => invoke(runtime, descriptor, request).await,
        Some(policy) => {
            with_retry(policy, OrchestrationError::is_retryable, || {
                invoke(runtime, descriptor, Arc::clone(&request))
            })
            .await
        }
    }
}

/// One bounded predictor call on its own task
async fn invoke(
    runtime: &IsolatedRuntime,
    descriptor: &PredictorDescriptor,
    request: Arc<AnalyticalRequest>,
) -> Result<Prediction, OrchestrationError> {
    let kind = descriptor.kind();
    let handler = Arc::clone(descriptor.handler());
    let predictor = handler.name();

    let outcome = with_deadline_on(runtime.handle(), descriptor.timeout(), async move {
        handler.predict(&request).await
    })
    .await;

    match outcome {
        Ok(Ok(prediction)) => check_prediction(kind, predictor, prediction),
        Ok(Err(err)) => {
            error!(%kind, predictor, error = %format!("{:#}", err), "Predictor returned an error");
            Err(OrchestrationError::Predictor { kind })
        }
        Err(TimeoutError::Elapsed(timeout)) => Err(OrchestrationError::Timeout { kind, timeout }),
        Err(err) => {
            error!(%kind, predictor, error = %err, "Predictor task aborted abnormally");
            Err(OrchestrationError::Predictor { kind })
        }
    }
}

/// Reject predictor output that would break the result invariants
fn check_prediction(
    kind: AnalysisKind,
    predictor: &str,
    prediction: Prediction,
) -> Result<Prediction, OrchestrationError> {
    let body_kind = prediction.body.kind();
    if body_kind != kind {
        error!(%kind, %body_kind, predictor, "Predictor returned a body of the wrong kind");
        return Err(OrchestrationError::Predictor { kind });
    }

    if !(0.0..=1.0).contains(&prediction.confidence) {
        error!(
            %kind,
            predictor,
            confidence = prediction.confidence,
            "Predictor returned confidence outside [0, 1]"
        );
        return Err(OrchestrationError::Predictor { kind });
    }

    Ok(prediction)
}
