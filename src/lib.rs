//! # Retrier
//!
//! Backoff delay sequences and a cancellable retry executor.
//!
//! Transient failures (a dropped connection, a contended lock, a rate
//! limit) usually go away if you wait a little. Retrying immediately in a
//! tight loop makes contention worse; retrying on a schedule that spreads
//! out does not.
//!
//! The crate splits that job in two:
//!
//! - [`Backoff`] describes the schedule. It is plain data: a growth law
//!   (constant, linear, exponential, Fibonacci, ...) wrapped in optional
//!   decorators that cap the number of retries or add jitter.
//! - [`Retrier`] runs an operation against a schedule, waits between
//!   attempts, and stops early when a [`Cancellation`] fires.
//!
//! ## Quick Example
//!
//! ```rust
//! use retrier::{Backoff, Cancellation, Outcome, Retrier, RetryError};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let retrier = Retrier::new(
//!     Backoff::exponential(Duration::from_millis(1))
//!         .with_max_retries(4)
//!         .with_jitter(Duration::from_micros(200)),
//! );
//!
//! let cancel = Cancellation::with_timeout(Duration::from_secs(2));
//! let mut remaining_failures = 2;
//!
//! let result = retrier
//!     .run_with(&cancel, |_| {
//!         let outcome = if remaining_failures == 0 {
//!             Outcome::Success
//!         } else {
//!             remaining_failures -= 1;
//!             Outcome::Retry
//!         };
//!         async move { Ok::<_, std::io::Error>(outcome) }
//!     })
//!     .await;
//!
//! match result {
//!     Ok(true) => println!("succeeded"),
//!     Ok(false) => println!("gave up after the last retry"),
//!     Err(RetryError::Cancelled(reason)) => println!("stopped: {reason}"),
//!     Err(e) => println!("failed: {e}"),
//! }
//! # });
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backoff;
pub mod retry;

// Re-exports
pub use backoff::{Backoff, Decorator, Delays, JitterSource};
pub use retry::{
    try_with_config, CancelReason, Cancellation, ConfigError, Outcome, RetryConfig, RetryError,
    RetryEvent, Retrier, TooManyRetries, TtlError,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backoff::{Backoff, Decorator};
    pub use crate::retry::{Cancellation, Outcome, RetryConfig, RetryError, Retrier};
}
