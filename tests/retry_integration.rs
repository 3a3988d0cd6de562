//! End-to-end retry scenarios through the public API.

use retrier::prelude::*;
use retrier::{CancelReason, ConfigError, JitterSource, RetryEvent};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, PartialEq, thiserror::Error)]
enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
}

/// A fake server that is busy for the first `busy_for` calls and hands out a
/// retry-after hint while busy.
#[derive(Debug, Clone)]
struct FlakyServer {
    calls: Arc<AtomicU32>,
    busy_for: u32,
    retry_after: Option<Duration>,
}

impl FlakyServer {
    fn new(busy_for: u32, retry_after: Option<Duration>) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            busy_for,
            retry_after,
        }
    }

    async fn request(&self) -> Result<Outcome, ApiError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.busy_for {
            return Ok(Outcome::Success);
        }
        Ok(match self.retry_after {
            Some(d) => Outcome::RetryAfter(d),
            None => Outcome::Retry,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tokio::test(start_paused = true)]
async fn test_flaky_server_recovers_within_budget() {
    let server = FlakyServer::new(3, None);
    let retrier = Retrier::new(Backoff::fibonacci(Duration::from_millis(10)).with_max_retries(5));

    let result = retrier
        .run(|_| {
            let server = server.clone();
            async move { server.request().await }
        })
        .await;

    assert!(result.unwrap());
    assert_eq!(server.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_server_hints_are_followed_in_counter_form() {
    let server = FlakyServer::new(2, Some(Duration::from_millis(5)));
    let config = RetryConfig::default()
        .with_retry_count(3)
        .and_then(|c| c.with_retry_delay(Duration::from_secs(30)))
        .unwrap();
    let retrier = Retrier::from_config(&config).unwrap();
    let start = tokio::time::Instant::now();

    let result = retrier
        .run(|_| {
            let server = server.clone();
            async move { server.request().await }
        })
        .await;

    assert!(result.unwrap());
    assert_eq!(server.calls(), 3);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_exposes_last_hint() {
    let server = FlakyServer::new(u32::MAX, Some(Duration::from_millis(42)));
    let config = RetryConfig {
        retry_count: 2,
        retry_delay: Duration::from_millis(10),
        retry_jitter: Duration::from_millis(5),
    };

    let result = retrier::try_with_config(config, |_| {
        let server = server.clone();
        async move { server.request().await }
    })
    .await;

    match result {
        Err(RetryError::TooManyRetries(err)) => {
            assert_eq!(err.ttl(), Some(Duration::from_millis(42)));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(server.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_short_circuits() {
    let calls = Arc::new(AtomicU32::new(0));
    let retrier = Retrier::new(Backoff::constant(Duration::from_secs(1)).with_max_retries(10));

    let result = retrier
        .run(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<bool, _>(ApiError::Unauthorized) }
        })
        .await;

    assert_eq!(
        result.unwrap_err().into_operation(),
        Some(ApiError::Unauthorized)
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_stops_long_backoff() {
    let server = FlakyServer::new(u32::MAX, None);
    let retrier = Retrier::new(Backoff::exponential(Duration::from_millis(100)));
    let cancel = Cancellation::with_timeout(Duration::from_millis(650));

    let result = retrier
        .run_with(&cancel, |_| {
            let server = server.clone();
            async move { server.request().await }
        })
        .await;

    // Attempts at 0, 100, 300 ms; the 400ms wait after that crosses 650ms.
    assert!(matches!(
        result,
        Err(RetryError::Cancelled(CancelReason::DeadlineExceeded))
    ));
    assert_eq!(server.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_seeded_jitter_is_reproducible_across_runs() {
    let record = |seed: u64| async move {
        let delays = Arc::new(Mutex::new(Vec::new()));
        let retrier = Retrier::new(
            Backoff::linear(Duration::from_millis(100))
                .with_max_retries(4)
                .with_jitter_from(Duration::from_millis(50), JitterSource::from_seed(seed)),
        );
        let _ = retrier
            .run_with_hooks(
                &Cancellation::new(),
                |_| async { Ok::<_, ApiError>(false) },
                {
                    let delays = delays.clone();
                    move |event: &RetryEvent| delays.lock().unwrap().push(event.next_delay)
                },
            )
            .await;
        let delays = delays.lock().unwrap().clone();
        delays
    };

    let first = record(7).await;
    let second = record(7).await;
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn test_invalid_config_never_builds_a_retrier() {
    let config = RetryConfig {
        retry_count: 1,
        retry_delay: Duration::from_millis(2),
        retry_jitter: Duration::from_millis(3),
    };
    assert_eq!(
        Retrier::from_config(&config).unwrap_err(),
        ConfigError::InvalidRetryDelay
    );
}
