//! Cooperative cancellation for retry waits.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Cancellation`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CancelReason {
    /// [`Cancellation::cancel`] was called.
    #[error("operation cancelled")]
    Cancelled,
    /// The deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellation signal with an optional deadline.
///
/// Cloning is cheap and every clone observes the same signal. The retry
/// executor only looks at it while waiting between attempts; an operation
/// that wants to stop mid-flight should watch the clone it is handed.
///
/// # Examples
///
/// ```rust
/// use retrier::{CancelReason, Cancellation};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let cancel = Cancellation::new();
/// assert_eq!(cancel.reason(), None);
///
/// cancel.cancel();
/// assert_eq!(cancel.cancelled().await, CancelReason::Cancelled);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that fires only when [`Cancellation::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one shared with a server's shutdown path.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A signal that also fires once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_in(timeout)
    }

    /// A signal that also fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::new().deadline_at(deadline)
    }

    /// Add or tighten a deadline `timeout` from now.
    pub fn deadline_in(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.deadline_at(deadline),
            None => self,
        }
    }

    /// Add or tighten a deadline. An earlier existing deadline is kept.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// A child signal: fires when this one does, and can be cancelled on its own
    /// without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Fire the signal for this handle, its clones and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Why the signal has fired, or `None` if it has not.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Returns true if the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait until the signal fires and report why.
    pub async fn cancelled(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => CancelReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}
