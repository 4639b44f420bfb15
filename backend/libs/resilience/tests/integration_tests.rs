//! Integration tests for resilience library
use resilience::{with_deadline, with_retry, RetryConfig, TimeoutError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ==================== Deadline Tests ====================

#[tokio::test]
async fn test_deadline_does_not_affect_concurrent_calls() {
    let slow = tokio::spawn(with_deadline(Duration::from_millis(20), async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "slow"
    }));
    let fast = tokio::spawn(with_deadline(Duration::from_secs(1), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        "fast"
    }));

    let slow = slow.await.unwrap();
    let fast = fast.await.unwrap();

    assert!(matches!(slow, Err(TimeoutError::Elapsed(_))));
    assert_eq!(fast.unwrap(), "fast");
}

#[tokio::test]
async fn test_deadline_error_message() {
    let err = with_deadline(Duration::from_millis(5), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
    })
    .await
    .unwrap_err();

    assert!(err.to_string().starts_with("Operation timed out after"));
}

// ==================== Retry + Deadline ====================

#[tokio::test]
async fn test_retry_each_attempt_gets_its_own_deadline() {
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();
    let config = RetryConfig {
        max_retries: 2,
        initial_backoff: Duration::from_millis(5),
        jitter: false,
        ..Default::default()
    };

    let start = Instant::now();
    let result = with_retry(&config, TimeoutError::is_elapsed, move || {
        let attempt = attempts_clone.fetch_add(1, Ordering::SeqCst);
        with_deadline(Duration::from_millis(30), async move {
            if attempt == 0 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            attempt
        })
    })
    .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_retry_gives_up_on_panics_when_predicate_rejects_them() {
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();

    let result: Result<(), TimeoutError> =
        with_retry(&RetryConfig::default(), TimeoutError::is_elapsed, move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            with_deadline(Duration::from_secs(1), async {
                panic!("boom");
            })
        })
        .await;

    assert!(matches!(result, Err(TimeoutError::Panicked(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
