//! Reconnect backoff.

use std::time::Duration;

/// How a dropped connection is retried.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth factor applied after every failed attempt. Values below 1.0
    /// are treated as 1.0.
    pub decay: f64,
    /// Give up after this many consecutive failed retries. `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            decay: 1.5,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Retry at a fixed interval, forever.
    #[must_use]
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_delay: interval,
            max_delay: interval,
            decay: 1.0,
            max_attempts: None,
        }
    }

    /// Start a backoff sequence for this policy.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: self.clone(),
            attempts: 0,
        }
    }
}

/// Delay sequence for consecutive reconnect attempts.
#[derive(Clone, Debug)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Backoff {
    /// Delay before the next attempt, or `None` once the attempt limit is hit.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self
            .policy
            .max_attempts
            .is_some_and(|max| self.attempts >= max)
        {
            return None;
        }

        let decay = if self.policy.decay.is_finite() {
            self.policy.decay.max(1.0)
        } else {
            1.0
        };
        let max = self.policy.max_delay.max(self.policy.initial_delay);
        let factor = decay.powi(i32::try_from(self.attempts).unwrap_or(i32::MAX));
        let secs = self.policy.initial_delay.as_secs_f64() * factor;

        self.attempts = self.attempts.saturating_add(1);

        let delay = Duration::try_from_secs_f64(secs).unwrap_or(max);
        Some(delay.min(max))
    }

    /// Start over from the initial delay. Called after a successful open.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
