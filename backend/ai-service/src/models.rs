//! Request and result types flowing through the orchestration layer.
//!
//! `AnalyticalRequest` can only be built by the request validator, so every
//! instance already satisfies the payload/kind invariant. `AnalyticalResult`
//! is immutable once assembled by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Category of analytical request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Trend,
    Sentiment,
    Forecast,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Trend,
        AnalysisKind::Sentiment,
        AnalysisKind::Forecast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Trend => "trend",
            AnalysisKind::Sentiment => "sentiment",
            AnalysisKind::Forecast => "forecast",
        }
    }

    /// Payload field name used by the per-kind endpoints
    pub fn legacy_payload_field(&self) -> &'static str {
        match self {
            AnalysisKind::Trend => "historical_data",
            AnalysisKind::Sentiment => "reviews",
            AnalysisKind::Forecast => "historical_sales",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown analysis kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for AnalysisKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trend" | "trend-prediction" | "trend_prediction" => Ok(AnalysisKind::Trend),
            "sentiment" | "sentiment-analysis" | "sentiment_analysis" => {
                Ok(AnalysisKind::Sentiment)
            }
            "forecast" | "sales-forecast" | "sales_forecast" => Ok(AnalysisKind::Forecast),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Identity established by the auth gate for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    subject: String,
}

impl AuthContext {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Kind-specific input data
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    Trend {
        historical_data: Vec<f64>,
    },
    Sentiment {
        reviews: Vec<String>,
    },
    Forecast {
        historical_sales: Vec<f64>,
        horizon_days: u32,
    },
}

impl RequestPayload {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            RequestPayload::Trend { .. } => AnalysisKind::Trend,
            RequestPayload::Sentiment { .. } => AnalysisKind::Sentiment,
            RequestPayload::Forecast { .. } => AnalysisKind::Forecast,
        }
    }
}

/// A validated analytical request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticalRequest {
    subject_id: String,
    payload: RequestPayload,
}

impl AnalyticalRequest {
    pub(crate) fn new(subject_id: String, payload: RequestPayload) -> Self {
        Self {
            subject_id,
            payload,
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.payload.kind()
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    /// Numeric series for trend and forecast requests
    pub fn series(&self) -> Option<&[f64]> {
        match &self.payload {
            RequestPayload::Trend { historical_data } => Some(historical_data),
            RequestPayload::Forecast {
                historical_sales, ..
            } => Some(historical_sales),
            RequestPayload::Sentiment { .. } => None,
        }
    }

    /// Number of data points or texts carried by the payload
    pub fn input_len(&self) -> usize {
        match &self.payload {
            RequestPayload::Trend { historical_data } => historical_data.len(),
            RequestPayload::Sentiment { reviews } => reviews.len(),
            RequestPayload::Forecast {
                historical_sales, ..
            } => historical_sales.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Upward,
    Downward,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPrediction {
    pub trend: TrendDirection,
    pub confidence: f64,
    pub forecast: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub overall: SentimentLabel,
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesForecast {
    pub period: String,
    pub predicted_sales: f64,
    pub confidence_interval: [f64; 2],
}

/// Kind-specific result body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionBody {
    Trend(TrendPrediction),
    Sentiment(SentimentSummary),
    Forecast(SalesForecast),
}

impl PredictionBody {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            PredictionBody::Trend(_) => AnalysisKind::Trend,
            PredictionBody::Sentiment(_) => AnalysisKind::Sentiment,
            PredictionBody::Forecast(_) => AnalysisKind::Forecast,
        }
    }
}

/// Raw output of a predictor before the orchestrator wraps it
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub body: PredictionBody,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failure,
}

/// Versioned response envelope returned for every completed request
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticalResult {
    status: ResultStatus,
    kind: AnalysisKind,
    subject_id: String,
    body: PredictionBody,
    confidence: f64,
    model_version: String,
    generated_at: DateTime<Utc>,
}

impl AnalyticalResult {
    pub(crate) fn success(
        request: &AnalyticalRequest,
        prediction: Prediction,
        model_version: &str,
    ) -> Self {
        Self {
            status: ResultStatus::Success,
            kind: request.kind(),
            subject_id: request.subject_id().to_string(),
            body: prediction.body,
            confidence: prediction.confidence,
            model_version: model_version.to_string(),
            generated_at: Utc::now(),
        }
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn body(&self) -> &PredictionBody {
        &self.body
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_accepts_endpoint_aliases() {
        assert_eq!("Trend".parse::<AnalysisKind>(), Ok(AnalysisKind::Trend));
        assert_eq!(
            "sentiment-analysis".parse::<AnalysisKind>(),
            Ok(AnalysisKind::Sentiment)
        );
        assert_eq!(
            " sales_forecast ".parse::<AnalysisKind>(),
            Ok(AnalysisKind::Forecast)
        );
        assert!("weather".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_result_envelope_shape() {
        let request = AnalyticalRequest::new(
            "B08N5WRWNW".to_string(),
            RequestPayload::Trend {
                historical_data: vec![1.0, 1.1],
            },
        );
        let prediction = Prediction {
            body: PredictionBody::Trend(TrendPrediction {
                trend: TrendDirection::Upward,
                confidence: 0.85,
                forecast: vec![1.0, 1.1],
            }),
            confidence: 0.85,
        };

        let result = AnalyticalResult::success(&request, prediction, "mock-trend/1.0.0");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["kind"], "trend");
        assert_eq!(json["subject_id"], "B08N5WRWNW");
        assert_eq!(json["body"]["trend"], "upward");
        assert_eq!(json["confidence"], 0.85);
        assert_eq!(json["model_version"], "mock-trend/1.0.0");
        assert!(json["generated_at"].is_string());
    }
}
