//! Shared random source for jittered delays.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A cloneable handle to a random generator used by jitter decorators.
///
/// Every clone draws from the same generator. Draws are serialized by a
/// mutex, so cursors running on different threads can share one source.
///
/// # Examples
///
/// ```rust
/// use retrier::{Backoff, JitterSource};
/// use std::time::Duration;
///
/// // Same seed, same draws.
/// let a = Backoff::constant(Duration::from_millis(100))
///     .with_jitter_from(Duration::from_millis(10), JitterSource::from_seed(7));
/// let b = Backoff::constant(Duration::from_millis(100))
///     .with_jitter_from(Duration::from_millis(10), JitterSource::from_seed(7));
///
/// let xs: Vec<_> = a.delays().take(5).collect();
/// let ys: Vec<_> = b.delays().take(5).collect();
/// assert_eq!(xs, ys);
/// ```
#[derive(Clone)]
pub struct JitterSource {
    rng: Arc<Mutex<StdRng>>,
}

static GLOBAL: OnceLock<JitterSource> = OnceLock::new();

impl JitterSource {
    /// The process-wide source, seeded once from the system clock.
    pub fn global() -> Self {
        GLOBAL.get_or_init(Self::from_time).clone()
    }

    /// A fresh source seeded from the system clock.
    pub fn from_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::from_seed(seed)
    }

    /// A deterministic source, mainly for tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Perturb `delay` by a uniform draw in `[-max, +max]`, clamped at zero.
    pub fn jitter(&self, delay: Duration, max: Duration) -> Duration {
        let max = max.as_nanos();
        if max == 0 {
            return delay;
        }
        let draw = self.rng.lock().random_range(0..=max.saturating_mul(2));
        let offset = draw as i128 - max as i128;
        from_nanos_saturating(delay.as_nanos() as i128 + offset)
    }

    /// Returns true if both handles share one generator.
    pub fn same_source(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rng, &other.rng)
    }
}

impl Default for JitterSource {
    fn default() -> Self {
        Self::global()
    }
}

impl PartialEq for JitterSource {
    fn eq(&self, other: &Self) -> bool {
        self.same_source(other)
    }
}

impl fmt::Debug for JitterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitterSource")
            .field("global", &GLOBAL.get().is_some_and(|g| g.same_source(self)))
            .finish_non_exhaustive()
    }
}

/// Convert signed nanoseconds to a `Duration`, clamping to `[0, Duration::MAX]`.
pub(crate) fn from_nanos_saturating(nanos: i128) -> Duration {
    if nanos <= 0 {
        return Duration::ZERO;
    }
    let nanos = nanos as u128;
    let secs = nanos / 1_000_000_000;
    match u64::try_from(secs) {
        Ok(secs) => Duration::new(secs, (nanos % 1_000_000_000) as u32),
        Err(_) => Duration::MAX,
    }
}
