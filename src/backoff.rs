//! Exponential backoff for reconnecting the event subscription.

use std::time::Duration;

/// Reconnect settings.  Monitors without a policy give up on the first
/// session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Number of retries after the first attempt.  Zero retries forever.
    pub max_retries: u32,
    /// A session that stayed up at least this long before failing resets
    /// the backoff, so only rapid repeated failures escalate it.
    pub stability_window: Duration,
}

impl ReconnectPolicy {
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            stability_window: Duration::from_secs(60),
        }
    }

    /// Sessions that ran at least this long reset the delay and the retry
    /// count.  Must be non-zero, or every failure counts as the first.
    pub fn with_stability_window(mut self, window: Duration) -> Self {
        self.stability_window = window;
        self
    }
}

/// Attempt counter and current delay for one supervisor run.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
    delay: Duration,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            delay: policy.min_delay,
        }
    }

    /// Failed attempts counted since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failed session that ran for `uptime`.  Returns the delay to
    /// wait before the next attempt, or `None` once retries are exhausted.
    pub fn next_delay(&mut self, uptime: Duration) -> Option<Duration> {
        if uptime >= self.policy.stability_window {
            self.attempt = 0;
            self.delay = self.policy.min_delay;
        }

        self.attempt += 1;
        if self.policy.max_retries > 0 && self.attempt > self.policy.max_retries {
            return None;
        }

        let delay = self.delay;
        self.delay = self
            .delay
            .saturating_mul(2)
            .min(self.policy.max_delay);
        Some(delay)
    }
}
