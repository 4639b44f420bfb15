use crate::registry::PredictorSettings;
use anyhow::{anyhow, Result};
use resilience::RetryConfig;
use serde::Deserialize;
use std::time::Duration;

const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,
    pub workers: usize,
    pub service_name: String,

    // Auth
    pub jwt_secret: String,

    // Validation
    pub max_series_len: usize,

    // Predictor dispatch
    pub trend_timeout_ms: u64,
    pub sentiment_timeout_ms: u64,
    pub forecast_timeout_ms: u64,
    /// Retries after the first call; 0 disables retry
    pub predictor_retry_max_retries: u32,
    pub predictor_retry_backoff_ms: u64,
    pub predictor_threads: usize,

    // Observability
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Hosting platforms hand out the port through PORT
        let default_port = std::env::var("PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(5000);

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", i64::from(default_port))?
            .set_default("workers", 4)?
            .set_default("service_name", "ai-service")?
            .set_default("max_series_len", 10_000)?
            .set_default("trend_timeout_ms", 2000)?
            .set_default("sentiment_timeout_ms", 2000)?
            .set_default("forecast_timeout_ms", 5000)?
            .set_default("predictor_retry_max_retries", 0)?
            .set_default("predictor_retry_backoff_ms", 100)?
            .set_default("predictor_threads", 4)?
            .set_default("log_level", "info")?
            .set_default("log_format", "text")?
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.workers == 0 {
            return Err(anyhow!("Worker count must be greater than 0"));
        }

        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow!(
                "JWT secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            ));
        }

        if self.predictor_threads == 0 {
            return Err(anyhow!("Predictor thread count must be greater than 0"));
        }

        if self.max_series_len == 0 {
            return Err(anyhow!("Max series length must be greater than 0"));
        }

        if self.trend_timeout_ms == 0 || self.sentiment_timeout_ms == 0 || self.forecast_timeout_ms == 0
        {
            return Err(anyhow!("Predictor timeouts must be greater than 0"));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(anyhow!(
                "Log format must be 'text' or 'json', got '{}'",
                self.log_format
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    pub fn predictor_settings(&self) -> PredictorSettings {
        let retry = (self.predictor_retry_max_retries > 0).then(|| {
            RetryConfig::with_retries(
                self.predictor_retry_max_retries,
                Duration::from_millis(self.predictor_retry_backoff_ms),
            )
        });

        PredictorSettings {
            trend_timeout: Duration::from_millis(self.trend_timeout_ms),
            sentiment_timeout: Duration::from_millis(self.sentiment_timeout_ms),
            forecast_timeout: Duration::from_millis(self.forecast_timeout_ms),
            retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn base_config() -> Config {
        Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
            workers: 4,
            service_name: "ai-service".to_string(),
            jwt_secret: SECRET.to_string(),
            max_series_len: 10_000,
            trend_timeout_ms: 2000,
            sentiment_timeout_ms: 2000,
            forecast_timeout_ms: 5000,
            predictor_retry_max_retries: 0,
            predictor_retry_backoff_ms: 100,
            predictor_threads: 4,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }

    fn clear_env() {
        for key in [
            "PORT",
            "HTTP_PORT",
            "JWT_SECRET",
            "LOG_FORMAT",
            "FORECAST_TIMEOUT_MS",
            "PREDICTOR_RETRY_MAX_RETRIES",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = base_config();
        config.jwt_secret = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = base_config();
        config.log_format = "yaml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = base_config();
        config.forecast_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_predictor_settings_without_retry() {
        let settings = base_config().predictor_settings();
        assert_eq!(settings.trend_timeout, Duration::from_secs(2));
        assert_eq!(settings.forecast_timeout, Duration::from_secs(5));
        assert!(settings.retry.is_none());
    }

    #[test]
    fn test_predictor_settings_with_retry() {
        let mut config = base_config();
        config.predictor_retry_max_retries = 2;
        config.predictor_retry_backoff_ms = 50;

        // Two retries on top of the first call
        let retry = config.predictor_settings().retry.unwrap();
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.initial_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_zero_predictor_threads_rejected() {
        let mut config = base_config();
        config.predictor_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_retry_key_counts_retries() {
        clear_env();
        std::env::set_var("JWT_SECRET", SECRET);
        std::env::set_var("PREDICTOR_RETRY_MAX_RETRIES", "1");

        let config = Config::from_env().unwrap();
        assert_eq!(config.predictor_retry_max_retries, 1);
        assert_eq!(config.predictor_settings().retry.unwrap().max_retries, 1);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("JWT_SECRET", SECRET);

        let config = Config::from_env().unwrap();
        assert_eq!(config.http_host, "0.0.0.0");
        assert_eq!(config.http_port, 5000);
        assert_eq!(config.service_name, "ai-service");
        assert_eq!(config.max_series_len, 10_000);
        assert_eq!(config.log_format, "text");
        assert!(config.validate().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("JWT_SECRET", SECRET);
        std::env::set_var("PORT", "8080");
        std::env::set_var("FORECAST_TIMEOUT_MS", "750");
        std::env::set_var("LOG_FORMAT", "json");

        let config = Config::from_env().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.forecast_timeout_ms, 750);
        assert!(config.json_logs());

        std::env::set_var("HTTP_PORT", "9090");
        let config = Config::from_env().unwrap();
        assert_eq!(config.http_port, 9090);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_jwt_secret_fails() {
        clear_env();
        assert!(Config::from_env().is_err());
    }
}
