//! The retry loop.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::cancel::Cancellation;
use super::config::RetryConfig;
use super::error::{ConfigError, RetryError, TtlError};
use crate::backoff::{Backoff, Decorator, Delays};

/// What one completed attempt asks the executor to do next.
///
/// An operation reports fatal errors through its `Err` value; `Outcome`
/// only distinguishes success from the two kinds of retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stop and report success.
    Success,
    /// Retry after the policy's next delay.
    Retry,
    /// Retry after exactly this delay instead of the policy's.
    ///
    /// `RetryAfter(Duration::ZERO)` retries immediately. The override still
    /// consumes one retry from the budget, and it only takes effect when the
    /// executor has delay overrides enabled.
    RetryAfter(Duration),
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The explicit delay override, if any.
    pub fn delay_override(&self) -> Option<Duration> {
        match self {
            Self::RetryAfter(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<bool> for Outcome {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Success
        } else {
            Self::Retry
        }
    }
}

/// Information about a scheduled retry, passed to hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryEvent {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// How long the executor will wait before the next attempt.
    pub next_delay: Duration,
    /// True if `next_delay` came from the operation rather than the policy.
    pub overridden: bool,
    /// Total elapsed time since the first attempt.
    pub elapsed: Duration,
}

/// Drives an operation through a [`Backoff`] sequence.
///
/// A `Retrier` holds only configuration. Each run creates its own cursor and
/// timer, so one value can be cloned or shared across tasks and used for any
/// number of concurrent runs.
///
/// It comes in two configurations that share one loop:
///
/// - **Sequence form** ([`Retrier::new`]): exhaustion is reported as
///   `Ok(false)` and delay overrides are ignored.
/// - **Counter form** ([`Retrier::from_config`]): exhaustion is reported as
///   [`RetryError::TooManyRetries`] with the last delay hint attached, and
///   [`Outcome::RetryAfter`] replaces the policy delay.
///
/// [`Retrier::with_delay_override`] switches between the two behaviours for
/// any backoff.
///
/// # Examples
///
/// ```rust
/// use retrier::{Backoff, Retrier};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let retrier = Retrier::new(Backoff::constant(Duration::from_millis(1)).with_max_retries(5));
/// let calls = &AtomicU32::new(0);
///
/// let ok = retrier
///     .run(move |_| async move {
///         // Succeed on the third call.
///         Ok::<_, std::io::Error>(calls.fetch_add(1, Ordering::SeqCst) == 2)
///     })
///     .await
///     .unwrap();
///
/// assert!(ok);
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Retrier {
    backoff: Backoff,
    cancellation: Option<Cancellation>,
    delay_override: bool,
}

impl Retrier {
    /// A sequence-form executor over `backoff`.
    pub fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            cancellation: None,
            delay_override: false,
        }
    }

    /// A sequence-form executor over `backoff` wrapped in `decorators`, in order.
    pub fn with_decorators<I>(backoff: Backoff, decorators: I) -> Self
    where
        I: IntoIterator<Item = Decorator>,
    {
        Self::new(backoff.decorate(decorators))
    }

    /// A counter-form executor built from flat settings.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] in `config`.
    pub fn from_config(config: &RetryConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.backoff()?).with_delay_override(true))
    }

    /// Bind a cancellation signal used by [`Retrier::run`].
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Enable or disable delay overrides and exhaustion errors.
    pub fn with_delay_override(mut self, enabled: bool) -> Self {
        self.delay_override = enabled;
        self
    }

    /// The delay sequence, decorators included.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// The bound cancellation signal, if any.
    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    /// Whether delay overrides are honoured.
    pub fn delay_override(&self) -> bool {
        self.delay_override
    }

    /// Run `op` until it succeeds, fails fatally, or the budget runs out.
    ///
    /// Uses the bound cancellation signal, or one that never fires.
    ///
    /// # Errors
    ///
    /// See [`Retrier::run_with`].
    pub async fn run<F, Fut, O, E>(&self, op: F) -> Result<bool, RetryError<E>>
    where
        F: FnMut(Cancellation) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        O: Into<Outcome>,
    {
        match &self.cancellation {
            Some(cancel) => self.execute(cancel, op, |_| {}).await,
            None => self.execute(&Cancellation::new(), op, |_| {}).await,
        }
    }

    /// Run `op`, racing every wait against `cancel`.
    ///
    /// `op` receives a clone of `cancel` on every call.
    ///
    /// # Errors
    ///
    /// - [`RetryError::Operation`] as soon as `op` returns an error.
    /// - [`RetryError::Cancelled`] if `cancel` fires during a wait.
    /// - [`RetryError::TooManyRetries`] on exhaustion, counter form only.
    pub async fn run_with<F, Fut, O, E>(
        &self,
        cancel: &Cancellation,
        op: F,
    ) -> Result<bool, RetryError<E>>
    where
        F: FnMut(Cancellation) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        O: Into<Outcome>,
    {
        self.execute(cancel, op, |_| {}).await
    }

    /// Like [`Retrier::run_with`], calling `on_retry` before every wait.
    ///
    /// The hook is synchronous and should not block.
    ///
    /// # Errors
    ///
    /// See [`Retrier::run_with`].
    pub async fn run_with_hooks<F, Fut, O, E, H>(
        &self,
        cancel: &Cancellation,
        op: F,
        on_retry: H,
    ) -> Result<bool, RetryError<E>>
    where
        F: FnMut(Cancellation) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        O: Into<Outcome>,
        H: FnMut(&RetryEvent),
    {
        self.execute(cancel, op, on_retry).await
    }

    async fn execute<F, Fut, O, E, H>(
        &self,
        cancel: &Cancellation,
        mut op: F,
        mut on_retry: H,
    ) -> Result<bool, RetryError<E>>
    where
        F: FnMut(Cancellation) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        O: Into<Outcome>,
        H: FnMut(&RetryEvent),
    {
        let start = Instant::now();
        let mut delays: Option<Delays> = None;
        let mut attempt = 0u32;
        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);

        loop {
            attempt = attempt.saturating_add(1);
            let outcome: Outcome = op(cancel.clone()).await.map_err(RetryError::Operation)?.into();
            let hint = match outcome {
                Outcome::Success => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(attempt, "operation succeeded");
                    return Ok(true);
                }
                Outcome::Retry => None,
                Outcome::RetryAfter(d) => Some(d),
            };

            let policy_delay = delays.get_or_insert_with(|| self.backoff.delays()).next();
            let Some(policy_delay) = policy_delay else {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, "retry budget exhausted");
                return if self.delay_override {
                    Err(TtlError::new(hint).into())
                } else {
                    Ok(false)
                };
            };

            let (delay, overridden) = match hint {
                Some(d) if self.delay_override => (d, true),
                _ => (policy_delay, false),
            };

            on_retry(&RetryEvent {
                attempt,
                next_delay: delay,
                overridden,
                elapsed: start.elapsed(),
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, ?delay, overridden, "retrying after delay");

            timer.as_mut().reset(deadline_after(delay));
            tokio::select! {
                biased;
                reason = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, %reason, "retry wait cancelled");
                    return Err(reason.into());
                }
                () = timer.as_mut() => {}
            }
        }
    }
}

/// Run `op` once with the counter-form executor described by `config`.
///
/// # Errors
///
/// [`RetryError::Config`] if `config` is invalid, otherwise as
/// [`Retrier::run`].
///
/// # Examples
///
/// ```rust
/// use retrier::{try_with_config, Outcome, RetryConfig, RetryError};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let config = RetryConfig {
///     retry_count: 2,
///     retry_delay: Duration::from_millis(1),
///     ..RetryConfig::default()
/// };
///
/// // Ask for an immediate retry every time, until the budget runs out.
/// let result = try_with_config(config, |_| async {
///     Ok::<_, std::io::Error>(Outcome::RetryAfter(Duration::ZERO))
/// })
/// .await;
///
/// match result {
///     Err(RetryError::TooManyRetries(err)) => assert_eq!(err.ttl(), Some(Duration::ZERO)),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// # });
/// ```
pub async fn try_with_config<F, Fut, O, E>(
    config: RetryConfig,
    op: F,
) -> Result<bool, RetryError<E>>
where
    F: FnMut(Cancellation) -> Fut,
    Fut: Future<Output = Result<O, E>>,
    O: Into<Outcome>,
{
    Retrier::from_config(&config)?.run(op).await
}

fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    // Far enough to never fire in practice, close enough not to overflow.
    now.checked_add(delay)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}
