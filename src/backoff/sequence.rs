//! Backoff recipes and decorators.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::cursor::Delays;
use super::jitter::JitterSource;

/// An immutable recipe for a sequence of retry delays.
///
/// A `Backoff` is pure data. Calling [`Backoff::delays`] creates a fresh
/// cursor that starts from the construction parameters; cursors never share
/// state with each other, so the same recipe can drive any number of runs.
///
/// The six base variants are infinite. Decorators wrap a recipe in a new one
/// and the nesting order is kept: capping then jittering is a different
/// pipeline from jittering then capping.
///
/// # Examples
///
/// ```rust
/// use retrier::Backoff;
/// use std::time::Duration;
///
/// let backoff = Backoff::exponential(Duration::from_secs(1)).with_max_retries(3);
///
/// let delays: Vec<_> = backoff.delays().collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_secs(1),
///         Duration::from_secs(2),
///         Duration::from_secs(4),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// The same delay every time.
    Constant(Duration),
    /// `base, 2*base, 3*base, ...`
    Linear {
        /// First delay and increment.
        base: Duration,
    },
    /// `base, base + rate, base + 2*rate, ...`
    LinearRate {
        /// First delay.
        base: Duration,
        /// Increment added after each delay.
        rate: Duration,
    },
    /// `base, 2*base, 4*base, ...`
    Exponential {
        /// First delay.
        base: Duration,
    },
    /// `base, base*(1+rate), base*(1+rate)^2, ...`
    ExponentialRate {
        /// First delay.
        base: Duration,
        /// Growth factor applied after each delay.
        rate: f64,
    },
    /// `base, 2*base, 3*base, 5*base, 8*base, ...`
    Fibonacci {
        /// First delay.
        base: Duration,
    },
    /// Stops the inner sequence after `retries` delays.
    MaxRetries {
        /// Wrapped recipe.
        inner: Box<Backoff>,
        /// Number of delays produced before exhaustion.
        retries: u32,
    },
    /// Adds a uniform random offset in `[-max, +max]` to each inner delay.
    Jitter {
        /// Wrapped recipe.
        inner: Box<Backoff>,
        /// Largest offset in either direction.
        max: Duration,
        /// Random source the offsets are drawn from.
        source: JitterSource,
    },
}

impl Backoff {
    /// Always wait `delay`.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let mut delays = Backoff::constant(Duration::from_millis(500)).delays();
    /// assert_eq!(delays.next(), Some(Duration::from_millis(500)));
    /// assert_eq!(delays.next(), Some(Duration::from_millis(500)));
    /// ```
    pub fn constant(delay: Duration) -> Self {
        Self::Constant(delay)
    }

    /// Grow by `base` every retry.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = Backoff::linear(Duration::from_secs(1)).delays().take(4).collect();
    /// assert_eq!(delays, [1, 2, 3, 4].map(Duration::from_secs));
    /// ```
    pub fn linear(base: Duration) -> Self {
        Self::Linear { base }
    }

    /// Start at `base` and grow by `rate` every retry.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = Backoff::linear_rate(Duration::from_secs(1), Duration::from_millis(500))
    ///     .delays()
    ///     .take(3)
    ///     .collect();
    /// assert_eq!(delays, [1000, 1500, 2000].map(Duration::from_millis));
    /// ```
    pub fn linear_rate(base: Duration, rate: Duration) -> Self {
        Self::LinearRate { base, rate }
    }

    /// Double every retry.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = Backoff::exponential(Duration::from_secs(1)).delays().take(4).collect();
    /// assert_eq!(delays, [1, 2, 4, 8].map(Duration::from_secs));
    /// ```
    pub fn exponential(base: Duration) -> Self {
        Self::Exponential { base }
    }

    /// Multiply by `1 + rate` every retry.
    ///
    /// The running value is kept in floating point nanoseconds and rounded
    /// to the nearest nanosecond when produced.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = Backoff::exponential_rate(Duration::from_secs(1), 0.2)
    ///     .delays()
    ///     .take(4)
    ///     .collect();
    /// assert_eq!(delays, [1000, 1200, 1440, 1728].map(Duration::from_millis));
    /// ```
    pub fn exponential_rate(base: Duration, rate: f64) -> Self {
        Self::ExponentialRate { base, rate }
    }

    /// Grow along the Fibonacci sequence seeded with `(0, base)`.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = Backoff::fibonacci(Duration::from_millis(10)).delays().take(5).collect();
    /// assert_eq!(delays, [10, 20, 30, 50, 80].map(Duration::from_millis));
    /// ```
    pub fn fibonacci(base: Duration) -> Self {
        Self::Fibonacci { base }
    }

    /// Allow at most `n` retries. `0` means no retries at all.
    ///
    /// ```rust
    /// use retrier::Backoff;
    /// use std::time::Duration;
    ///
    /// let mut delays = Backoff::constant(Duration::from_secs(1)).with_max_retries(3).delays();
    /// assert_eq!(delays.next(), Some(Duration::from_secs(1)));
    /// assert_eq!(delays.next(), Some(Duration::from_secs(1)));
    /// assert_eq!(delays.next(), Some(Duration::from_secs(1)));
    /// assert_eq!(delays.next(), None);
    /// assert_eq!(delays.next(), None);
    /// ```
    pub fn with_max_retries(self, n: u32) -> Self {
        Self::MaxRetries {
            inner: Box::new(self),
            retries: n,
        }
    }

    /// Randomly add or subtract up to `max` from every delay, using the
    /// process-wide [`JitterSource`].
    pub fn with_jitter(self, max: Duration) -> Self {
        self.with_jitter_from(max, JitterSource::global())
    }

    /// Like [`Backoff::with_jitter`], drawing from an explicit source.
    pub fn with_jitter_from(self, max: Duration, source: JitterSource) -> Self {
        Self::Jitter {
            inner: Box::new(self),
            max,
            source,
        }
    }

    /// Apply decorators in order, innermost first.
    ///
    /// ```rust
    /// use retrier::{Backoff, Decorator};
    /// use std::time::Duration;
    ///
    /// let backoff = Backoff::linear(Duration::from_secs(1)).decorate([
    ///     Decorator::MaxRetries(2),
    ///     Decorator::Jitter(Duration::from_millis(100)),
    /// ]);
    ///
    /// assert_eq!(backoff.delays().count(), 2);
    /// ```
    pub fn decorate<I>(self, decorators: I) -> Self
    where
        I: IntoIterator<Item = Decorator>,
    {
        decorators
            .into_iter()
            .fold(self, |backoff, decorator| decorator.apply(backoff))
    }

    /// Create a fresh cursor over this sequence.
    pub fn delays(&self) -> Delays {
        Delays::new(self)
    }

    /// Outermost retry cap, if the sequence is bounded by one.
    ///
    /// Jitter wrappers are looked through; the cap of the outermost
    /// [`Backoff::MaxRetries`] is returned.
    pub fn max_retries(&self) -> Option<u32> {
        match self {
            Self::MaxRetries { retries, .. } => Some(*retries),
            Self::Jitter { inner, .. } => inner.max_retries(),
            _ => None,
        }
    }
}

/// A wrapper applied to a [`Backoff`] recipe.
///
/// Decorators are plain data so retry settings can be listed in
/// configuration and applied with [`Backoff::decorate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Decorator {
    /// See [`Backoff::with_max_retries`].
    MaxRetries(u32),
    /// See [`Backoff::with_jitter`].
    Jitter(Duration),
}

impl Decorator {
    /// Wrap `backoff` in this decorator.
    pub fn apply(self, backoff: Backoff) -> Backoff {
        match self {
            Decorator::MaxRetries(n) => backoff.with_max_retries(n),
            Decorator::Jitter(max) => backoff.with_jitter(max),
        }
    }
}
