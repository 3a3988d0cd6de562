//! Per-run cursors over a [`Backoff`] recipe.

use std::iter::FusedIterator;
use std::time::Duration;

use super::jitter::{from_nanos_saturating, JitterSource};
use super::sequence::Backoff;

/// Mutable position within one run of a [`Backoff`] sequence.
///
/// `Some(delay)` is the next wait; `None` means the sequence is exhausted.
/// Once `None` has been returned every later call returns `None` as well.
#[derive(Debug, Clone)]
pub struct Delays {
    state: State,
}

#[derive(Debug, Clone)]
enum State {
    Constant(Duration),
    Linear {
        step: Duration,
        total: Duration,
    },
    LinearRate {
        next: Duration,
        rate: Duration,
    },
    Exponential {
        next: Duration,
    },
    ExponentialRate {
        next: f64,
        rate: f64,
    },
    Fibonacci {
        prev: Duration,
        curr: Duration,
    },
    MaxRetries {
        inner: Box<Delays>,
        remaining: u32,
    },
    Jitter {
        inner: Box<Delays>,
        max: Duration,
        source: JitterSource,
    },
}

impl Delays {
    pub(crate) fn new(backoff: &Backoff) -> Self {
        let state = match backoff {
            Backoff::Constant(d) => State::Constant(*d),
            Backoff::Linear { base } => State::Linear {
                step: *base,
                total: Duration::ZERO,
            },
            Backoff::LinearRate { base, rate } => State::LinearRate {
                next: *base,
                rate: *rate,
            },
            Backoff::Exponential { base } => State::Exponential { next: *base },
            Backoff::ExponentialRate { base, rate } => State::ExponentialRate {
                next: base.as_nanos() as f64,
                rate: *rate,
            },
            Backoff::Fibonacci { base } => State::Fibonacci {
                prev: Duration::ZERO,
                curr: *base,
            },
            Backoff::MaxRetries { inner, retries } => State::MaxRetries {
                inner: Box::new(inner.delays()),
                remaining: *retries,
            },
            Backoff::Jitter { inner, max, source } => State::Jitter {
                inner: Box::new(inner.delays()),
                max: *max,
                source: source.clone(),
            },
        };
        Self { state }
    }

    /// The next delay as a `(delay, done)` pair.
    ///
    /// An exhausted cursor yields `(Duration::ZERO, true)`.
    pub fn next_delay(&mut self) -> (Duration, bool) {
        match self.next() {
            Some(d) => (d, false),
            None => (Duration::ZERO, true),
        }
    }
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        match &mut self.state {
            State::Constant(d) => Some(*d),
            State::Linear { step, total } => {
                *total = total.saturating_add(*step);
                Some(*total)
            }
            State::LinearRate { next, rate } => {
                let v = *next;
                *next = next.saturating_add(*rate);
                Some(v)
            }
            State::Exponential { next } => {
                let v = *next;
                *next = next.saturating_add(v);
                Some(v)
            }
            State::ExponentialRate { next, rate } => {
                let v = *next;
                *next = clamp_float_nanos(v + v * *rate);
                Some(from_float_nanos(v))
            }
            State::Fibonacci { prev, curr } => {
                let sum = prev.saturating_add(*curr);
                *prev = *curr;
                *curr = sum;
                Some(sum)
            }
            State::MaxRetries { inner, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                inner.next()
            }
            State::Jitter { inner, max, source } => {
                let v = inner.next()?;
                Some(source.jitter(v, *max))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            State::MaxRetries { inner, remaining } => {
                let (_, upper) = inner.size_hint();
                let cap = *remaining as usize;
                (0, Some(upper.map_or(cap, |u| u.min(cap))))
            }
            State::Jitter { inner, .. } => inner.size_hint(),
            _ => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Delays {}

/// Keep a running value inside `[0, Duration::MAX]` so a shrinking rate
/// settles at zero instead of changing sign.
fn clamp_float_nanos(nanos: f64) -> f64 {
    if nanos.is_nan() {
        return 0.0;
    }
    nanos.clamp(0.0, Duration::MAX.as_nanos() as f64)
}

fn from_float_nanos(nanos: f64) -> Duration {
    if nanos.is_nan() || nanos <= 0.0 {
        return Duration::ZERO;
    }
    if nanos >= i128::MAX as f64 {
        return Duration::MAX;
    }
    from_nanos_saturating(nanos.round() as i128)
}
