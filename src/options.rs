use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::ReconnectPolicy;
use crate::filter::Filter;
use crate::gate::GateTimings;
use crate::observer::{LogObserver, Observer};

/// Default bound on a single list-and-inspect pass.
pub const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings for a [`Monitor`](crate::Monitor).
#[derive(Clone)]
pub struct Options {
    pub filter: Filter,
    pub timings: GateTimings,
    pub pull_timeout: Duration,
    /// `None` ends the monitor on the first session failure.
    pub reconnect: Option<ReconnectPolicy>,
    pub observer: Arc<dyn Observer>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            filter: Filter::accept_all(),
            timings: GateTimings::default(),
            pull_timeout: DEFAULT_PULL_TIMEOUT,
            reconnect: None,
            observer: Arc::new(LogObserver),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("filter", &self.filter)
            .field("timings", &self.timings)
            .field("pull_timeout", &self.pull_timeout)
            .field("reconnect", &self.reconnect)
            .finish_non_exhaustive()
    }
}

impl Options {
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Quiet period that must pass after the last event before refreshing.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.timings.debounce = debounce;
        self
    }

    /// Longest a refresh can be deferred while events keep arriving.
    /// Values below the debounce period are raised to it.
    pub fn with_max_debounce(mut self, max_debounce: Duration) -> Self {
        self.timings.max_debounce = max_debounce;
        self
    }

    /// Refresh anyway after this long without any event.  Clamped to at
    /// least [`MIN_IDLE`](crate::gate::MIN_IDLE).
    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.timings.max_idle = max_idle;
        self
    }

    pub fn with_pull_timeout(mut self, timeout: Duration) -> Self {
        self.pull_timeout = timeout;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }
}
