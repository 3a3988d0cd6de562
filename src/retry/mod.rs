//! Retry execution with backoff and cancellation.
//!
//! A [`Retrier`] calls an operation, and while the operation reports a
//! retryable failure it waits for the next delay of its [`Backoff`] and
//! calls it again. Each wait is raced against a [`Cancellation`].
//!
//! # Quick Start
//!
//! ```rust
//! use retrier::{Backoff, Cancellation, Retrier};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let retrier = Retrier::new(
//!     Backoff::exponential(Duration::from_millis(1)).with_max_retries(3),
//! );
//! let cancel = Cancellation::with_timeout(Duration::from_secs(5));
//!
//! // An operation that never succeeds: the budget runs out after 1 + 3 calls.
//! let ok = retrier
//!     .run_with(&cancel, |_| async { Ok::<_, std::io::Error>(false) })
//!     .await
//!     .unwrap();
//! assert!(!ok);
//! # });
//! ```
//!
//! # Outcomes
//!
//! The operation returns `Result<O, E>` where `O: Into<Outcome>`:
//!
//! - `Err(e)`: fatal; returned as [`RetryError::Operation`] without retrying.
//! - [`Outcome::Success`] (or `true`): stop and return `Ok(true)`.
//! - [`Outcome::Retry`] (or `false`): wait for the policy delay.
//! - [`Outcome::RetryAfter`]: wait for the given delay instead, when delay
//!   overrides are enabled.
//!
//! # Error Types
//!
//! - [`ConfigError`]: invalid [`RetryConfig`], reported at construction
//! - [`RetryError`]: everything an execution can end with
//! - [`TtlError`]: exhaustion in the counter form, with the last delay hint
//! - [`CancelReason`]: why a [`Cancellation`] fired
//!
//! [`Backoff`]: crate::Backoff

mod cancel;
mod config;
mod error;
mod executor;

pub use cancel::{CancelReason, Cancellation};
pub use config::{RetryConfig, MIN_RETRY_DELAY};
pub use error::{ConfigError, RetryError, TooManyRetries, TtlError};
pub use executor::{try_with_config, Outcome, RetryEvent, Retrier};
