//! Backoff delay sequences.
//!
//! A [`Backoff`] is a recipe describing how long to wait before each retry.
//! It is plain data: cloning it, comparing it or handing it to several
//! executors has no side effects. Calling [`Backoff::delays`] creates a
//! [`Delays`] cursor that walks one run of the sequence.
//!
//! # Growth Laws
//!
//! - **Constant**: `d, d, d, ...`
//! - **Linear**: `d, 2d, 3d, ...`
//! - **LinearRate**: `d, d + r, d + 2r, ...`
//! - **Exponential**: `d, 2d, 4d, ...`
//! - **ExponentialRate**: `d, d(1+r), d(1+r)^2, ...`
//! - **Fibonacci**: `d, 2d, 3d, 5d, 8d, ...`
//!
//! All of them are infinite. Bound them with [`Backoff::with_max_retries`].
//!
//! # Jitter
//!
//! [`Backoff::with_jitter`] spreads delays by a uniform random offset so
//! that many clients retrying at once do not hit a server in lockstep.
//! Offsets come from a [`JitterSource`]; pass a seeded one with
//! [`Backoff::with_jitter_from`] for reproducible runs.
//!
//! ```rust
//! use retrier::Backoff;
//! use std::time::Duration;
//!
//! // Cap first, then jitter: three delays, each within 100ms of 1s, 2s and 3s.
//! let backoff = Backoff::linear(Duration::from_secs(1))
//!     .with_max_retries(3)
//!     .with_jitter(Duration::from_millis(100));
//!
//! for (i, d) in backoff.delays().enumerate() {
//!     let v = Duration::from_secs(i as u64 + 1);
//!     assert!(d >= v - Duration::from_millis(100) && d <= v + Duration::from_millis(100));
//! }
//! ```

mod cursor;
mod jitter;
mod sequence;

pub use cursor::Delays;
pub use jitter::JitterSource;
pub use sequence::{Backoff, Decorator};
