//! Refresh gate: decides when a burst of arrivals has settled.
//!
//! The gate is a plain state value.  The event loop feeds it arrivals and
//! asks for the next deadline; when that deadline passes it calls
//! [`RefreshGate::poll`], which reports why a refresh is due and moves the
//! gate back to idle.  No timers live in here, so every transition can be
//! driven with hand-picked instants in tests.
//!
//! Three deadlines are tracked:
//!
//! * **debounce** – pushed back by every arrival while a window is open,
//!   giving low latency when events trickle in;
//! * **max debounce** – set once when the window opens and never moved,
//!   bounding latency under a constant stream of events;
//! * **idle** – pushed back by every arrival and every refresh; fires even
//!   with no window open so a silently stalled event feed still refreshes.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Timer lengths for a [`RefreshGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTimings {
    pub debounce: Duration,
    pub max_debounce: Duration,
    pub max_idle: Duration,
}

impl Default for GateTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            max_debounce: Duration::from_secs(5),
            max_idle: Duration::from_secs(30),
        }
    }
}

/// Shortest idle period a gate will use.
pub const MIN_IDLE: Duration = Duration::from_millis(1);

impl GateTimings {
    /// Clamp inconsistent settings: max debounce is raised to at least the
    /// debounce period and the idle period to at least [`MIN_IDLE`].
    pub fn normalized(self) -> Self {
        Self {
            debounce: self.debounce,
            max_debounce: self.max_debounce.max(self.debounce),
            max_idle: self.max_idle.max(MIN_IDLE),
        }
    }
}

/// Why the gate asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// First pull of a session.
    Initial,
    /// Arrivals went quiet for the debounce period.
    Debounce,
    /// Arrivals kept coming for the whole max-debounce period.
    MaxDebounce,
    /// Nothing arrived for the idle period.
    Idle,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Initial => "initial",
            Trigger::Debounce => "debounce",
            Trigger::MaxDebounce => "max-debounce",
            Trigger::Idle => "idle",
        };
        f.write_str(s)
    }
}

/// An open debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    debounce_at: Instant,
    max_debounce_at: Instant,
}

#[derive(Debug, Clone)]
pub struct RefreshGate {
    timings: GateTimings,
    window: Option<Window>,
    idle_at: Instant,
}

impl RefreshGate {
    /// Create an idle gate.  `now` should be the moment the session's
    /// initial refresh completed.  `timings` are [normalized](GateTimings::normalized).
    pub fn new(timings: GateTimings, now: Instant) -> Self {
        let timings = timings.normalized();
        Self {
            timings,
            window: None,
            idle_at: now + timings.max_idle,
        }
    }

    /// Whether a debounce window is open.
    pub fn is_pending(&self) -> bool {
        self.window.is_some()
    }

    /// Record an arrival.
    pub fn arrival(&mut self, now: Instant) {
        self.idle_at = now + self.timings.max_idle;
        let debounce_at = now + self.timings.debounce;
        match &mut self.window {
            Some(window) => window.debounce_at = debounce_at,
            None => {
                self.window = Some(Window {
                    debounce_at,
                    max_debounce_at: now + self.timings.max_debounce,
                })
            }
        }
    }

    /// The earliest instant at which [`poll`](Self::poll) will return a trigger.
    pub fn next_deadline(&self) -> Instant {
        match self.window {
            Some(window) => window
                .debounce_at
                .min(window.max_debounce_at)
                .min(self.idle_at),
            None => self.idle_at,
        }
    }

    /// Check the deadlines against `now`.  When one has passed, the window
    /// is closed, the idle deadline restarts from `now` and the reason is
    /// returned.  Coinciding deadlines report debounce first, then max
    /// debounce, then idle; all of them lead to the same single refresh.
    pub fn poll(&mut self, now: Instant) -> Option<Trigger> {
        let trigger = match self.window {
            Some(window) if window.debounce_at <= now => Trigger::Debounce,
            Some(window) if window.max_debounce_at <= now => Trigger::MaxDebounce,
            _ if self.idle_at <= now => Trigger::Idle,
            _ => return None,
        };
        self.window = None;
        self.idle_at = now + self.timings.max_idle;
        Some(trigger)
    }
}
