//! Capability registry: request kind -> predictor descriptor
//!
//! Registrations go through [`RegistryBuilder`] during startup. `build()`
//! freezes the map into a [`CapabilityRegistry`] that is only ever read, so
//! lookups need no locking once the registry is shared behind an `Arc`.

use crate::models::AnalysisKind;
use crate::predictors::{
    MockForecastPredictor, MockSentimentPredictor, MockTrendPredictor, Predictor,
};
use resilience::RetryConfig;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a predictor is already registered for kind `{0}`")]
    DuplicateRegistration(AnalysisKind),

    #[error("no predictor registered for kind `{0}`")]
    NotFound(AnalysisKind),
}

/// Registry entry binding a kind to its handler and dispatch policy
#[derive(Clone)]
pub struct PredictorDescriptor {
    kind: AnalysisKind,
    handler: Arc<dyn Predictor>,
    timeout: Duration,
    retry: Option<RetryConfig>,
}

impl PredictorDescriptor {
    pub fn new(kind: AnalysisKind, handler: Arc<dyn Predictor>, timeout: Duration) -> Self {
        Self {
            kind,
            handler,
            timeout,
            retry: None,
        }
    }

    /// Enable retries for this predictor; each attempt gets the full timeout
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn handler(&self) -> &Arc<dyn Predictor> {
        &self.handler
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry(&self) -> Option<&RetryConfig> {
        self.retry.as_ref()
    }
}

impl fmt::Debug for PredictorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictorDescriptor")
            .field("kind", &self.kind)
            .field("handler", &self.handler.name())
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Per-kind dispatch settings applied to the default predictors
#[derive(Debug, Clone)]
pub struct PredictorSettings {
    pub trend_timeout: Duration,
    pub sentiment_timeout: Duration,
    pub forecast_timeout: Duration,
    pub retry: Option<RetryConfig>,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            trend_timeout: Duration::from_secs(2),
            sentiment_timeout: Duration::from_secs(2),
            forecast_timeout: Duration::from_secs(5),
            retry: None,
        }
    }
}

impl PredictorSettings {
    pub fn timeout_for(&self, kind: AnalysisKind) -> Duration {
        match kind {
            AnalysisKind::Trend => self.trend_timeout,
            AnalysisKind::Sentiment => self.sentiment_timeout,
            AnalysisKind::Forecast => self.forecast_timeout,
        }
    }

    fn descriptor(&self, kind: AnalysisKind, handler: Arc<dyn Predictor>) -> PredictorDescriptor {
        let descriptor = PredictorDescriptor::new(kind, handler, self.timeout_for(kind));
        match &self.retry {
            Some(retry) => descriptor.with_retry(retry.clone()),
            None => descriptor,
        }
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: HashMap<AnalysisKind, PredictorDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        kind: AnalysisKind,
        handler: Arc<dyn Predictor>,
        timeout: Duration,
    ) -> Result<&mut Self, RegistryError> {
        self.register_descriptor(PredictorDescriptor::new(kind, handler, timeout))
    }

    /// Register a fully specified descriptor; a second registration for the
    /// same kind is rejected and leaves the first one in place
    pub fn register_descriptor(
        &mut self,
        descriptor: PredictorDescriptor,
    ) -> Result<&mut Self, RegistryError> {
        match self.descriptors.entry(descriptor.kind) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateRegistration(descriptor.kind)),
            Entry::Vacant(slot) => {
                info!(
                    kind = %descriptor.kind,
                    predictor = descriptor.handler.name(),
                    timeout_ms = descriptor.timeout.as_millis() as u64,
                    retry = descriptor.retry.is_some(),
                    "Registered predictor"
                );
                slot.insert(descriptor);
                Ok(self)
            }
        }
    }

    pub fn build(self) -> CapabilityRegistry {
        CapabilityRegistry {
            descriptors: self.descriptors,
        }
    }
}

#[derive(Debug)]
pub struct CapabilityRegistry {
    descriptors: HashMap<AnalysisKind, PredictorDescriptor>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry serving every kind with its mock predictor
    pub fn with_mock_predictors(settings: &PredictorSettings) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        builder
            .register_descriptor(settings.descriptor(AnalysisKind::Trend, Arc::new(MockTrendPredictor)))?
            .register_descriptor(
                settings.descriptor(AnalysisKind::Sentiment, Arc::new(MockSentimentPredictor)),
            )?
            .register_descriptor(
                settings.descriptor(AnalysisKind::Forecast, Arc::new(MockForecastPredictor)),
            )?;
        Ok(builder.build())
    }

    pub fn resolve(&self, kind: AnalysisKind) -> Result<&PredictorDescriptor, RegistryError> {
        self.descriptors
            .get(&kind)
            .ok_or(RegistryError::NotFound(kind))
    }

    /// Registered kinds in canonical order
    pub fn kinds(&self) -> Vec<AnalysisKind> {
        AnalysisKind::ALL
            .into_iter()
            .filter(|kind| self.descriptors.contains_key(kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = CapabilityRegistry::builder();
        builder
            .register(
                AnalysisKind::Trend,
                Arc::new(MockTrendPredictor),
                Duration::from_secs(1),
            )
            .unwrap();

        let err = builder
            .register(
                AnalysisKind::Trend,
                Arc::new(MockTrendPredictor),
                Duration::from_secs(9),
            )
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRegistration(AnalysisKind::Trend));

        // The original registration is kept
        let registry = builder.build();
        assert_eq!(
            registry.resolve(AnalysisKind::Trend).unwrap().timeout(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_resolve_unregistered_kind() {
        let mut builder = CapabilityRegistry::builder();
        builder
            .register(
                AnalysisKind::Sentiment,
                Arc::new(MockSentimentPredictor),
                Duration::from_secs(1),
            )
            .unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.resolve(AnalysisKind::Forecast).unwrap_err(),
            RegistryError::NotFound(AnalysisKind::Forecast)
        );
        assert_eq!(registry.kinds(), vec![AnalysisKind::Sentiment]);
    }

    #[test]
    fn test_mock_registry_uses_settings() {
        let settings = PredictorSettings {
            forecast_timeout: Duration::from_millis(750),
            retry: Some(RetryConfig::with_retries(2, Duration::from_millis(50))),
            ..Default::default()
        };
        let registry = CapabilityRegistry::with_mock_predictors(&settings).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.kinds(), AnalysisKind::ALL.to_vec());

        let forecast = registry.resolve(AnalysisKind::Forecast).unwrap();
        assert_eq!(forecast.timeout(), Duration::from_millis(750));
        assert_eq!(forecast.handler().name(), "mock-forecast");
        assert_eq!(forecast.retry().map(|r| r.max_retries), Some(2));
    }

    #[test]
    fn test_retry_off_by_default() {
        let registry = CapabilityRegistry::with_mock_predictors(&PredictorSettings::default())
            .unwrap();
        for kind in AnalysisKind::ALL {
            assert!(registry.resolve(kind).unwrap().retry().is_none());
        }
    }
}
