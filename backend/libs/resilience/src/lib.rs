//! Resilience patterns for predictor dispatch
//!
//! This library provides the primitives the orchestration layer relies on:
//! - **Deadline**: Runs an operation on its own task and aborts it once the time limit elapses
//! - **Isolated runtime**: Dedicated worker threads so blocking work cannot stall the caller's timer
//! - **Retry**: Exponential backoff with jitter, opt-in per call site
//!
//! # Example: Bounded call
//!
//! ```rust,no_run
//! use resilience::with_deadline;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = with_deadline(Duration::from_millis(500), async {
//!         // Slow computation here
//!         42
//!     })
//!     .await;
//!
//!     assert_eq!(result.unwrap(), 42);
//! }
//! ```
//!
//! # Example: Retry with a predicate
//!
//! ```rust,no_run
//! use resilience::{with_retry, RetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = with_retry(&RetryConfig::default(), |_e: &String| true, || async {
//!         Ok::<_, String>(())
//!     })
//!     .await;
//! }
//! ```

pub mod retry;
pub mod runtime;
pub mod timeout;

pub use retry::{with_retry, RetryConfig};
pub use runtime::IsolatedRuntime;
pub use timeout::{with_deadline, with_deadline_on, TimeoutError};
