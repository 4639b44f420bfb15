//! Dedicated multi-thread runtime for work that must not share threads with
//! the caller
//!
//! Request workers (actix, `#[tokio::test]`) are single-threaded. Work
//! spawned there that blocks the thread also blocks the timer that is supposed
//! to bound it. Work spawned on an [`IsolatedRuntime`] runs on its own
//! threads, so the caller's deadline fires on time.

use std::io;
use tokio::runtime::{Builder, Handle, Runtime};

pub struct IsolatedRuntime {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl IsolatedRuntime {
    pub fn new(name: &str, worker_threads: usize) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name(name)
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        tracing::info!(name, worker_threads, "Isolated runtime started");

        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl std::fmt::Debug for IsolatedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolatedRuntime").finish_non_exhaustive()
    }
}

impl Drop for IsolatedRuntime {
    // Dropping a Runtime blocks, which panics inside async contexts
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_blocking_work_does_not_stall_caller() {
        let runtime = IsolatedRuntime::new("isolated-test", 1).unwrap();

        let blocked = runtime.handle().spawn(async {
            std::thread::sleep(Duration::from_millis(300));
        });

        // The caller's timer still fires while the isolated thread is blocked
        let waited = tokio::time::timeout(Duration::from_millis(20), blocked).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_drop_inside_async_context() {
        let runtime = IsolatedRuntime::new("isolated-drop", 1).unwrap();
        let answer = runtime.handle().spawn(async { 42 }).await.unwrap();
        assert_eq!(answer, 42);
        drop(runtime);
    }
}
