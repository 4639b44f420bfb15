//! Deterministic predictors returning canned results
//!
//! Used as the default implementation until model-backed predictors are
//! registered, and as the reference for contract tests.

use super::Predictor;
use crate::models::{
    AnalyticalRequest, Prediction, PredictionBody, RequestPayload, SalesForecast,
    SentimentLabel, SentimentSummary, TrendDirection, TrendPrediction,
};
use crate::validation::DEFAULT_HORIZON_DAYS;
use anyhow::Result;
use async_trait::async_trait;

const MOCK_VERSION: &str = "mock-1.0.0";

const TREND_CONFIDENCE: f64 = 0.85;
const TREND_FORECAST: [f64; 5] = [1.0, 1.1, 1.2, 1.3, 1.4];

const SENTIMENT_SCORE: f64 = 0.75;
const SENTIMENT_CONFIDENCE: f64 = 0.9;

const FORECAST_PREDICTED_SALES: f64 = 1000.0;
const FORECAST_INTERVAL: [f64; 2] = [800.0, 1200.0];
/// Number of observations at which forecast confidence reaches 0.5
const FORECAST_CONFIDENCE_HALF_POINT: f64 = 5.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct MockTrendPredictor;

#[async_trait]
impl Predictor for MockTrendPredictor {
    fn name(&self) -> &'static str {
        "mock-trend"
    }

    fn version(&self) -> &'static str {
        MOCK_VERSION
    }

    async fn predict(&self, _request: &AnalyticalRequest) -> Result<Prediction> {
        Ok(Prediction {
            body: PredictionBody::Trend(TrendPrediction {
                trend: TrendDirection::Upward,
                confidence: TREND_CONFIDENCE,
                forecast: TREND_FORECAST.to_vec(),
            }),
            confidence: TREND_CONFIDENCE,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockSentimentPredictor;

#[async_trait]
impl Predictor for MockSentimentPredictor {
    fn name(&self) -> &'static str {
        "mock-sentiment"
    }

    fn version(&self) -> &'static str {
        MOCK_VERSION
    }

    async fn predict(&self, _request: &AnalyticalRequest) -> Result<Prediction> {
        Ok(Prediction {
            body: PredictionBody::Sentiment(SentimentSummary {
                overall: SentimentLabel::Positive,
                score: SENTIMENT_SCORE,
                confidence: SENTIMENT_CONFIDENCE,
            }),
            confidence: SENTIMENT_CONFIDENCE,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockForecastPredictor;

impl MockForecastPredictor {
    /// Confidence grows with the number of observations: n / (n + 5)
    pub fn confidence_for(observations: usize) -> f64 {
        let n = observations as f64;
        n / (n + FORECAST_CONFIDENCE_HALF_POINT)
    }
}

#[async_trait]
impl Predictor for MockForecastPredictor {
    fn name(&self) -> &'static str {
        "mock-forecast"
    }

    fn version(&self) -> &'static str {
        MOCK_VERSION
    }

    async fn predict(&self, request: &AnalyticalRequest) -> Result<Prediction> {
        let horizon_days = match request.payload() {
            RequestPayload::Forecast { horizon_days, .. } => *horizon_days,
            _ => DEFAULT_HORIZON_DAYS,
        };

        Ok(Prediction {
            body: PredictionBody::Forecast(SalesForecast {
                period: format!("{}_days", horizon_days),
                predicted_sales: FORECAST_PREDICTED_SALES,
                confidence_interval: FORECAST_INTERVAL,
            }),
            confidence: Self::confidence_for(request.input_len()),
        })
    }
}
