//! Error types for retry operations.

use std::time::Duration;

use super::cancel::CancelReason;

/// Rejected retry settings.
///
/// Returned when a [`RetryConfig`](super::RetryConfig) is built or
/// validated, never while an operation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The retry count is negative.
    #[error("number of retries must be greater than or equal to 0")]
    InvalidRetryCount,
    /// The delay is under one millisecond or under the jitter.
    #[error(
        "delay between retries must be greater than or equal to 1 millisecond \
         and must be greater than or equal to jitter"
    )]
    InvalidRetryDelay,
    /// The jitter is under one millisecond or over the delay.
    #[error(
        "retry jitter must be greater than or equal to 1 millisecond \
         and must be less than or equal to delay"
    )]
    InvalidRetryJitter,
}

/// The retry budget ran out before the operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("number of retries exceeded")]
pub struct TooManyRetries;

/// Exhaustion error carrying the last delay hint the operation returned.
///
/// The hint is whatever the final failed attempt passed in
/// [`Outcome::RetryAfter`](super::Outcome::RetryAfter), or `None` when it
/// asked for the policy delay. Servers often send such hints (a lock's time
/// to live, a `Retry-After` header), so callers can use it to schedule their
/// own next attempt.
///
/// # Examples
///
/// ```rust
/// use retrier::{TooManyRetries, TtlError};
/// use std::error::Error;
/// use std::time::Duration;
///
/// let err = TtlError::new(Some(Duration::from_millis(42)));
/// assert_eq!(err.ttl(), Some(Duration::from_millis(42)));
/// assert!(err.source().unwrap().is::<TooManyRetries>());
/// assert_eq!(err.to_string(), TooManyRetries.to_string());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{source}")]
pub struct TtlError {
    source: TooManyRetries,
    ttl: Option<Duration>,
}

impl TtlError {
    /// Create a new exhaustion error with the given hint.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            source: TooManyRetries,
            ttl,
        }
    }

    /// The last delay hint observed before giving up.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

/// Error returned by a retry execution.
///
/// Every variant is surfaced verbatim; the executor never retries on an
/// error and never hides one.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The operation itself failed. Never retried.
    #[error("{0}")]
    Operation(E),
    /// The cancellation fired while waiting for the next attempt.
    #[error(transparent)]
    Cancelled(#[from] CancelReason),
    /// The retry budget was spent (counter form only).
    #[error(transparent)]
    TooManyRetries(#[from] TtlError),
    /// The settings passed to a one-shot call were invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl<E> RetryError<E> {
    /// Returns true if the wait was cut short by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true if the retry budget was exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::TooManyRetries(_))
    }

    /// The cancellation reason, if any.
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(*reason),
            _ => None,
        }
    }

    /// The exhaustion details, if any.
    pub fn ttl_error(&self) -> Option<&TtlError> {
        match self {
            Self::TooManyRetries(err) => Some(err),
            _ => None,
        }
    }

    /// Extract the operation's error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}
