//! Request schema validation
//!
//! Converts an untyped JSON body into an [`AnalyticalRequest`]. This is the
//! only place where request data is inspected field by field; everything
//! downstream works with the typed payload.
//!
//! Fields are checked in a fixed order: `kind`, then the payload (including
//! `horizon_days` for forecasts), then `subject_id`. The first failing field
//! determines the error.

use crate::models::{AnalysisKind, AnalyticalRequest, RequestPayload};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_MAX_SERIES_LEN: usize = 10_000;
pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("field `{0}` must contain at least one element")]
    EmptySeries(&'static str),

    #[error("field `{field}` exceeds the maximum of {max} elements")]
    SeriesTooLong { field: &'static str, max: usize },
}

impl ValidationError {
    /// Stable machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::TypeMismatch { .. } => "type_mismatch",
            ValidationError::EmptySeries(_) => "empty_series",
            ValidationError::SeriesTooLong { .. } => "series_too_long",
        }
    }

    fn mismatch(field: impl Into<String>, expected: &'static str) -> Self {
        ValidationError::TypeMismatch {
            field: field.into(),
            expected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_series_len: usize,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SERIES_LEN)
    }
}

impl RequestValidator {
    pub fn new(max_series_len: usize) -> Self {
        Self { max_series_len }
    }

    pub fn max_series_len(&self) -> usize {
        self.max_series_len
    }

    pub fn validate(&self, raw: &Value) -> Result<AnalyticalRequest, ValidationError> {
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationError::mismatch("request", "a JSON object"))?;

        let kind = parse_kind(object)?;
        let (field, items) = payload_items(object, kind)?;

        let payload = match kind {
            AnalysisKind::Trend => RequestPayload::Trend {
                historical_data: self.numeric_series(field, items)?,
            },
            AnalysisKind::Sentiment => RequestPayload::Sentiment {
                reviews: self.text_series(field, items)?,
            },
            AnalysisKind::Forecast => RequestPayload::Forecast {
                historical_sales: self.numeric_series(field, items)?,
                horizon_days: parse_horizon(object)?,
            },
        };

        let subject_id = parse_subject(object)?;

        Ok(AnalyticalRequest::new(subject_id, payload))
    }

    fn check_len(&self, field: &'static str, len: usize) -> Result<(), ValidationError> {
        if len == 0 {
            return Err(ValidationError::EmptySeries(field));
        }
        if len > self.max_series_len {
            return Err(ValidationError::SeriesTooLong {
                field,
                max: self.max_series_len,
            });
        }
        Ok(())
    }

    fn numeric_series(
        &self,
        field: &'static str,
        items: &[Value],
    ) -> Result<Vec<f64>, ValidationError> {
        self.check_len(field, items.len())?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_f64()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| {
                        ValidationError::mismatch(format!("{}[{}]", field, index), "a finite number")
                    })
            })
            .collect()
    }

    fn text_series(
        &self,
        field: &'static str,
        items: &[Value],
    ) -> Result<Vec<String>, ValidationError> {
        self.check_len(field, items.len())?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::mismatch(format!("{}[{}]", field, index), "a string")
                })
            })
            .collect()
    }
}

/// Look up a field, treating an explicit `null` as absent
fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|value| !value.is_null())
}

fn parse_kind(object: &Map<String, Value>) -> Result<AnalysisKind, ValidationError> {
    let value = field(object, "kind").ok_or(ValidationError::MissingField("kind"))?;

    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ValidationError::mismatch("kind", "one of trend, sentiment, forecast"))
}

/// Resolve the payload array, preferring `payload` over the kind's legacy field
fn payload_items(
    object: &Map<String, Value>,
    kind: AnalysisKind,
) -> Result<(&'static str, &Vec<Value>), ValidationError> {
    let legacy = kind.legacy_payload_field();

    let (name, value) = match (field(object, "payload"), field(object, legacy)) {
        (Some(value), _) => ("payload", value),
        (None, Some(value)) => (legacy, value),
        (None, None) => return Err(ValidationError::MissingField("payload")),
    };

    value
        .as_array()
        .map(|items| (name, items))
        .ok_or_else(|| ValidationError::mismatch(name, "an array"))
}

fn parse_subject(object: &Map<String, Value>) -> Result<String, ValidationError> {
    let (name, value) = match (field(object, "subject_id"), field(object, "asin")) {
        (Some(value), _) => ("subject_id", value),
        (None, Some(value)) => ("asin", value),
        (None, None) => return Err(ValidationError::MissingField("subject_id")),
    };

    let subject = value
        .as_str()
        .ok_or_else(|| ValidationError::mismatch(name, "a string"))?
        .trim();

    if subject.is_empty() {
        return Err(ValidationError::MissingField("subject_id"));
    }

    Ok(subject.to_string())
}

fn parse_horizon(object: &Map<String, Value>) -> Result<u32, ValidationError> {
    match field(object, "horizon_days") {
        None => Ok(DEFAULT_HORIZON_DAYS),
        Some(value) => value
            .as_u64()
            .filter(|days| (1..=MAX_HORIZON_DAYS as u64).contains(days))
            .map(|days| days as u32)
            .ok_or_else(|| {
                ValidationError::mismatch("horizon_days", "an integer between 1 and 365")
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> RequestValidator {
        RequestValidator::default()
    }

    #[test]
    fn test_valid_trend_request() {
        let request = validator()
            .validate(&json!({
                "kind": "trend",
                "subject_id": "B08N5WRWNW",
                "payload": [1.0, 1.1, 1.05, 1.2]
            }))
            .unwrap();

        assert_eq!(request.kind(), AnalysisKind::Trend);
        assert_eq!(request.subject_id(), "B08N5WRWNW");
        assert_eq!(request.series(), Some(&[1.0, 1.1, 1.05, 1.2][..]));
    }

    #[test]
    fn test_legacy_field_names() {
        let request = validator()
            .validate(&json!({
                "kind": "sentiment",
                "asin": "B08N5WRWNW",
                "reviews": ["Great product!", "Love it!"]
            }))
            .unwrap();

        assert_eq!(
            request.payload(),
            &RequestPayload::Sentiment {
                reviews: vec!["Great product!".to_string(), "Love it!".to_string()]
            }
        );
    }

    #[test]
    fn test_integer_series_accepted() {
        let request = validator()
            .validate(&json!({
                "kind": "forecast",
                "asin": "B08N5WRWNW",
                "historical_sales": [100, 110, 105, 120, 115]
            }))
            .unwrap();

        assert_eq!(
            request.payload(),
            &RequestPayload::Forecast {
                historical_sales: vec![100.0, 110.0, 105.0, 120.0, 115.0],
                horizon_days: DEFAULT_HORIZON_DAYS,
            }
        );
    }

    #[test]
    fn test_empty_sentiment_payload_is_empty_series() {
        let err = validator()
            .validate(&json!({ "kind": "sentiment", "payload": [] }))
            .unwrap_err();

        assert_eq!(err, ValidationError::EmptySeries("payload"));
        assert_eq!(err.reason(), "empty_series");
    }

    #[test]
    fn test_missing_kind() {
        let err = validator()
            .validate(&json!({ "subject_id": "x", "payload": [1.0] }))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("kind"));
    }

    #[test]
    fn test_unknown_kind_is_type_mismatch() {
        let err = validator()
            .validate(&json!({ "kind": "weather", "subject_id": "x", "payload": [1.0] }))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { ref field, .. } if field == "kind"));
    }

    #[test]
    fn test_missing_payload() {
        let err = validator()
            .validate(&json!({ "kind": "trend", "subject_id": "x" }))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("payload"));
    }

    #[test]
    fn test_text_payload_for_numeric_kind() {
        let err = validator()
            .validate(&json!({ "kind": "trend", "subject_id": "x", "payload": [1.0, "up"] }))
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                field: "payload[1]".to_string(),
                expected: "a finite number",
            }
        );
    }

    #[test]
    fn test_numeric_payload_for_sentiment() {
        let err = validator()
            .validate(&json!({ "kind": "sentiment", "subject_id": "x", "payload": [0.5] }))
            .unwrap_err();
        assert_eq!(err.reason(), "type_mismatch");
    }

    #[test]
    fn test_payload_must_be_array() {
        let err = validator()
            .validate(&json!({ "kind": "trend", "subject_id": "x", "payload": "1,2,3" }))
            .unwrap_err();
        assert_eq!(err, ValidationError::mismatch("payload", "an array"));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let err = validator()
            .validate(&json!({ "kind": "trend", "subject_id": "   ", "payload": [1.0] }))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("subject_id"));
    }

    #[test]
    fn test_series_bound() {
        let err = RequestValidator::new(3)
            .validate(&json!({ "kind": "trend", "subject_id": "x", "payload": [1, 2, 3, 4] }))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SeriesTooLong {
                field: "payload",
                max: 3
            }
        );
    }

    #[test]
    fn test_horizon_bounds() {
        let ok = validator()
            .validate(&json!({
                "kind": "forecast", "subject_id": "x", "payload": [1.0], "horizon_days": 7
            }))
            .unwrap();
        assert!(matches!(
            ok.payload(),
            RequestPayload::Forecast { horizon_days: 7, .. }
        ));

        let err = validator()
            .validate(&json!({
                "kind": "forecast", "subject_id": "x", "payload": [1.0], "horizon_days": 0
            }))
            .unwrap_err();
        assert_eq!(err.reason(), "type_mismatch");
    }

    #[test]
    fn test_non_object_body() {
        let err = validator().validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err, ValidationError::mismatch("request", "a JSON object"));
    }
}
