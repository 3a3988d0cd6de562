//! Counter-style retry settings and their validation.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::backoff::Backoff;

/// Smallest accepted delay and non-zero jitter.
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Flat retry settings: a retry count, a delay and an optional jitter.
///
/// This is the configuration behind [`Retrier::from_config`](super::Retrier::from_config)
/// and [`try_with_config`](super::try_with_config). Values can be set field
/// by field and checked with [`RetryConfig::validate`], or through the
/// `with_*` setters, which check each change against the current state.
///
/// # Examples
///
/// ```rust
/// use retrier::{ConfigError, RetryConfig};
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_retry_count(3)?
///     .with_retry_delay(Duration::from_millis(100))?
///     .with_retry_jitter(Duration::from_millis(20))?;
/// assert_eq!(config.retry_count, 3);
///
/// // Jitter may never exceed the delay.
/// let err = config.with_retry_jitter(Duration::from_millis(500)).unwrap_err();
/// assert_eq!(err, ConfigError::InvalidRetryJitter);
/// # Ok::<(), ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    /// Retries after the first attempt. Must not be negative.
    ///
    /// Counts above `u32::MAX` are capped at `u32::MAX` retries when the
    /// delay sequence is built.
    pub retry_count: i64,
    /// Wait between attempts. At least one millisecond and at least the jitter.
    pub retry_delay: Duration,
    /// Largest random offset added to or taken from the delay. Zero disables
    /// jitter; otherwise at least one millisecond and at most the delay.
    pub retry_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 0,
            retry_delay: Duration::from_millis(100),
            retry_jitter: Duration::ZERO,
        }
    }
}

impl RetryConfig {
    /// Set the retry count.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRetryCount`] if `n` is negative.
    pub fn with_retry_count(mut self, n: i64) -> Result<Self, ConfigError> {
        check_count(n)?;
        self.retry_count = n;
        Ok(self)
    }

    /// Set the delay between attempts.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRetryDelay`] if `delay` is under one
    /// millisecond or under the configured jitter.
    pub fn with_retry_delay(mut self, delay: Duration) -> Result<Self, ConfigError> {
        check_delay(delay, self.retry_jitter)?;
        self.retry_delay = delay;
        Ok(self)
    }

    /// Set the jitter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRetryJitter`] if `jitter` is under one
    /// millisecond or over the configured delay.
    pub fn with_retry_jitter(mut self, jitter: Duration) -> Result<Self, ConfigError> {
        if jitter < MIN_RETRY_DELAY || jitter > self.retry_delay {
            return Err(ConfigError::InvalidRetryJitter);
        }
        self.retry_jitter = jitter;
        Ok(self)
    }

    /// Check every field.
    ///
    /// Used for configurations assembled directly or deserialized, where the
    /// order the values were set in is unknown. The count is checked first,
    /// then the delay against the jitter, then the jitter on its own.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count(self.retry_count)?;
        check_delay(self.retry_delay, self.retry_jitter)?;
        if !self.retry_jitter.is_zero() && self.retry_jitter < MIN_RETRY_DELAY {
            return Err(ConfigError::InvalidRetryJitter);
        }
        Ok(())
    }

    /// The delay sequence these settings describe.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found by [`RetryConfig::validate`].
    pub fn backoff(&self) -> Result<Backoff, ConfigError> {
        self.validate()?;
        let mut backoff = Backoff::constant(self.retry_delay);
        if !self.retry_jitter.is_zero() {
            backoff = backoff.with_jitter(self.retry_jitter);
        }
        // Capped; see the `retry_count` field docs.
        let retries = u32::try_from(self.retry_count).unwrap_or(u32::MAX);
        Ok(backoff.with_max_retries(retries))
    }
}

fn check_count(n: i64) -> Result<(), ConfigError> {
    if n < 0 {
        Err(ConfigError::InvalidRetryCount)
    } else {
        Ok(())
    }
}

fn check_delay(delay: Duration, jitter: Duration) -> Result<(), ConfigError> {
    if delay < MIN_RETRY_DELAY || delay < jitter {
        Err(ConfigError::InvalidRetryDelay)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_negative_count_is_rejected() {
        assert_eq!(
            RetryConfig::default().with_retry_count(-1),
            Err(ConfigError::InvalidRetryCount)
        );
    }

    #[test]
    fn test_sub_millisecond_delay_is_rejected() {
        assert_eq!(
            RetryConfig::default().with_retry_delay(Duration::from_micros(1)),
            Err(ConfigError::InvalidRetryDelay)
        );
    }

    #[test]
    fn test_delay_below_jitter_is_a_delay_error() {
        let result = RetryConfig::default()
            .with_retry_delay(ms(3))
            .and_then(|c| c.with_retry_jitter(ms(2)))
            .and_then(|c| c.with_retry_delay(ms(1)));
        assert_eq!(result, Err(ConfigError::InvalidRetryDelay));
    }

    #[test]
    fn test_sub_millisecond_jitter_is_rejected() {
        assert_eq!(
            RetryConfig::default().with_retry_jitter(Duration::from_micros(1)),
            Err(ConfigError::InvalidRetryJitter)
        );
    }

    #[test]
    fn test_jitter_above_delay_is_a_jitter_error() {
        let result = RetryConfig::default()
            .with_retry_delay(ms(2))
            .and_then(|c| c.with_retry_jitter(ms(3)));
        assert_eq!(result, Err(ConfigError::InvalidRetryJitter));
    }

    #[test]
    fn test_valid_settings_are_kept() {
        let config = RetryConfig::default()
            .with_retry_count(42)
            .and_then(|c| c.with_retry_delay(ms(100)))
            .and_then(|c| c.with_retry_jitter(ms(20)))
            .unwrap();
        assert_eq!(
            config,
            RetryConfig {
                retry_count: 42,
                retry_delay: ms(100),
                retry_jitter: ms(20),
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_checks_fields_in_order() {
        let config = RetryConfig {
            retry_count: -5,
            retry_delay: Duration::ZERO,
            retry_jitter: Duration::from_nanos(1),
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRetryCount));

        let config = RetryConfig {
            retry_count: 1,
            retry_delay: ms(5),
            retry_jitter: ms(10),
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRetryDelay));

        let config = RetryConfig {
            retry_count: 1,
            retry_delay: ms(5),
            retry_jitter: Duration::from_micros(10),
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRetryJitter));
    }

    #[test]
    fn test_default_is_valid() {
        assert!(RetryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_backoff_from_config() {
        let backoff = RetryConfig::default()
            .with_retry_count(2)
            .unwrap()
            .backoff()
            .unwrap();
        assert_eq!(backoff.max_retries(), Some(2));
        assert_eq!(backoff.delays().collect::<Vec<_>>(), vec![ms(100), ms(100)]);
    }

    #[test]
    fn test_backoff_from_config_with_jitter() {
        let config = RetryConfig {
            retry_count: 10,
            retry_delay: ms(50),
            retry_jitter: ms(10),
        };
        let delays: Vec<_> = config.backoff().unwrap().delays().collect();
        assert_eq!(delays.len(), 10);
        assert!(delays.iter().all(|d| *d >= ms(40) && *d <= ms(60)));
    }

    #[test]
    fn test_backoff_caps_huge_counts_at_u32_max() {
        let config = RetryConfig {
            retry_count: i64::MAX,
            ..RetryConfig::default()
        };
        assert_eq!(config.backoff().unwrap().max_retries(), Some(u32::MAX));

        let config = RetryConfig {
            retry_count: i64::from(u32::MAX) - 1,
            ..RetryConfig::default()
        };
        assert_eq!(config.backoff().unwrap().max_retries(), Some(u32::MAX - 1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: RetryConfig = serde_json::from_str(r#"{ "retry_count": 3 }"#).unwrap();
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.retry_delay, ms(100));
        assert!(config.validate().is_ok());

        let config: RetryConfig = serde_json::from_str(r#"{ "retry_count": -1 }"#).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidRetryCount));
    }
}
