//! Deadline enforcement for async operations
use std::any::Any;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
    #[error("Operation panicked: {0}")]
    Panicked(String),
    #[error("Operation was cancelled")]
    Cancelled,
}

impl TimeoutError {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }
}

/// Execute a future on a dedicated task of the current runtime, bounded by
/// `duration`. See [`with_deadline_on`].
pub async fn with_deadline<F, T>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    with_deadline_on(&Handle::current(), duration, future).await
}

/// Execute a future as a task on `runtime`, bounded by `duration`.
///
/// When the bound elapses the task is aborted, so the operation stops at its
/// next `.await` point and the caller returns immediately. A panic inside the
/// operation is captured and reported as [`TimeoutError::Panicked`] instead of
/// unwinding into the caller. Dropping the returned future also aborts the
/// task.
///
/// A result that arrives after the bound is still reported as
/// [`TimeoutError::Elapsed`]. That happens when the operation blocked the
/// thread the caller runs on; spawning on an
/// [`IsolatedRuntime`](crate::IsolatedRuntime) keeps the caller responsive.
pub async fn with_deadline_on<F, T>(
    runtime: &Handle,
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let started = Instant::now();
    let mut guard = AbortOnDrop(runtime.spawn(future));

    let outcome = timeout(duration, &mut guard.0).await;

    if outcome.is_err() || started.elapsed() > duration {
        guard.0.abort();
        tracing::debug!(
            ?duration,
            elapsed = ?started.elapsed(),
            "Deadline elapsed, aborted in-flight task"
        );
        return Err(TimeoutError::Elapsed(duration));
    }

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) if join_error.is_panic() => Err(TimeoutError::Panicked(
            panic_message(join_error.into_panic()),
        )),
        _ => Err(TimeoutError::Cancelled),
    }
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
