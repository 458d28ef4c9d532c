//! Diagnostics hook.
//!
//! The monitor reports what it is doing through an [`Observer`] handed to
//! it in [`Options`](crate::Options) rather than logging directly, so
//! embedders can route or silence it.  [`LogObserver`] is the default and
//! forwards everything to the `log` crate.

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::Error;
use crate::gate::Trigger;
use crate::hash::Fingerprint;
use crate::runtime::RuntimeError;
use crate::types::Arrival;

/// Something worth reporting.
#[derive(Debug)]
pub enum MonitorEvent<'a> {
    Subscribed,
    Arrival(&'a Arrival),
    Refreshing(Trigger),
    InspectFailed {
        id: &'a str,
        error: &'a RuntimeError,
    },
    Unchanged(Fingerprint),
    Changed {
        fingerprint: Fingerprint,
        count: usize,
    },
    Disconnected {
        attempt: u32,
        delay: Duration,
        error: &'a Error,
    },
    Reconnecting,
    RetriesExhausted {
        attempts: u32,
        error: &'a Error,
    },
}

pub trait Observer: Send + Sync {
    fn observe(&self, event: &MonitorEvent<'_>);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn observe(&self, event: &MonitorEvent<'_>) {
        match event {
            MonitorEvent::Subscribed => info!("Subscribed to docker events"),
            MonitorEvent::Arrival(arrival) => debug!(
                "Received event: {} {} for {}",
                arrival.kind, arrival.action, arrival.actor
            ),
            MonitorEvent::Refreshing(Trigger::MaxDebounce) => {
                debug!("Maximum debounce time exceeded, refreshing")
            }
            MonitorEvent::Refreshing(Trigger::Idle) => {
                debug!("Maximum idle time exceeded, refreshing")
            }
            MonitorEvent::Refreshing(trigger) => debug!("Refreshing containers ({})", trigger),
            MonitorEvent::InspectFailed { id, error } => {
                warn!("Failed to inspect container {}: {}", id, error)
            }
            MonitorEvent::Unchanged(fingerprint) => {
                debug!("Container state unchanged ({}), not invoking callback", fingerprint)
            }
            MonitorEvent::Changed { fingerprint, count } => info!(
                "Container state changed ({}), invoking callback with {} containers",
                fingerprint, count
            ),
            MonitorEvent::Disconnected {
                attempt,
                delay,
                error,
            } => warn!(
                "Event stream disconnected: {}. Reconnect attempt {} in {:?}",
                error, attempt, delay
            ),
            MonitorEvent::Reconnecting => info!("Reconnecting to docker event stream"),
            MonitorEvent::RetriesExhausted { attempts, error } => error!(
                "Max reconnect retries exceeded after {} attempts: {}",
                attempts, error
            ),
        }
    }
}
