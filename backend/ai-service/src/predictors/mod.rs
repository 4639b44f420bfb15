//! Predictor capability
//!
//! Every analytical kind is served by an implementation of [`Predictor`].
//! Implementations are shared across concurrent requests, so they must not
//! keep per-request mutable state.
//!
//! `predict` must not block its thread. CPU-heavy models belong in
//! `tokio::task::spawn_blocking` or a model server. Calls run on a dedicated
//! runtime so a blocking predictor still gets its timeout, but it occupies one
//! of that runtime's threads until it returns.

mod mock;

use crate::models::{AnalyticalRequest, Prediction};
use anyhow::Result;
use async_trait::async_trait;

pub use mock::{MockForecastPredictor, MockSentimentPredictor, MockTrendPredictor};

#[async_trait]
pub trait Predictor: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Version stamped onto every result this predictor produces
    fn version(&self) -> &'static str;

    async fn predict(&self, request: &AnalyticalRequest) -> Result<Prediction>;
}
