//! The watch loop.
//!
//! A session subscribes to runtime events, delivers the initial state and
//! then waits on three things at once: cancellation, the refresh gate's
//! next deadline and the next event.  Everything runs on that one task,
//! so the gate and the dedup cursor need no locking.  With a reconnect
//! policy, failed sessions are restarted with exponential backoff.

use std::convert::Infallible;

use futures_util::stream::StreamExt;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;

use crate::backoff::{Backoff, ReconnectPolicy};
use crate::error::Error;
use crate::gate::{RefreshGate, Trigger};
use crate::hash::Fingerprint;
use crate::observer::MonitorEvent;
use crate::options::Options;
use crate::runtime::ContainerRuntime;
use crate::types::Container;

/// Watches a [`ContainerRuntime`] and hands every changed, filtered
/// snapshot to `callback`.
///
/// The callback runs on the monitor's task and delays event handling
/// while it runs; hand work off if it is slow.  A panicking callback is
/// not caught and unwinds out of [`run`](Self::run).
pub struct Monitor<R, F> {
    runtime: R,
    callback: F,
    options: Options,
    cursor: Option<Fingerprint>,
}

impl<R, F> Monitor<R, F>
where
    R: ContainerRuntime,
    F: FnMut(&[Container]) + Send,
{
    pub fn new(runtime: R, callback: F, options: Options) -> Self {
        Self {
            runtime,
            callback,
            options,
            cursor: None,
        }
    }

    /// Fingerprint of the last delivered snapshot.
    pub fn cursor(&self) -> Option<Fingerprint> {
        self.cursor
    }

    /// Watch until `cancel` fires or a failure ends the monitor, and
    /// return the reason.  Deliberate shutdown is [`Error::Cancelled`].
    pub async fn run(&mut self, cancel: &CancellationToken) -> Error {
        match self.options.reconnect {
            Some(policy) => self.run_with_retry(policy, cancel).await,
            None => self.run_session(cancel).await,
        }
    }

    async fn run_with_retry(&mut self, policy: ReconnectPolicy, cancel: &CancellationToken) -> Error {
        let mut backoff = Backoff::new(policy);
        loop {
            if cancel.is_cancelled() {
                return Error::Cancelled;
            }

            let started = Instant::now();
            let error = self.run_session(cancel).await;
            if cancel.is_cancelled() || error.is_cancelled() {
                return Error::Cancelled;
            }

            let Some(delay) = backoff.next_delay(started.elapsed()) else {
                let attempts = backoff.attempt();
                self.observe(MonitorEvent::RetriesExhausted {
                    attempts,
                    error: &error,
                });
                return Error::RetryExhausted {
                    attempts,
                    source: Box::new(error),
                };
            };

            self.observe(MonitorEvent::Disconnected {
                attempt: backoff.attempt(),
                delay,
                error: &error,
            });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Error::Cancelled,
                _ = sleep(delay) => {}
            }

            self.observe(MonitorEvent::Reconnecting);
        }
    }

    async fn run_session(&mut self, cancel: &CancellationToken) -> Error {
        match self.session(cancel).await {
            Ok(never) => match never {},
            Err(e) => e,
        }
    }

    async fn session(&mut self, cancel: &CancellationToken) -> Result<Infallible, Error> {
        let mut events = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            subscribed = self.runtime.subscribe() => subscribed.map_err(Error::Subscribe)?,
        };
        self.observe(MonitorEvent::Subscribed);

        // State may have drifted while we were not subscribed.
        self.refresh(Trigger::Initial, cancel).await?;

        let mut gate = RefreshGate::new(self.options.timings, Instant::now());
        loop {
            // Checked against the clock on every turn so a stream that is
            // always ready cannot hold off a due refresh.
            if let Some(trigger) = gate.poll(Instant::now()) {
                self.refresh(trigger, cancel).await?;
                continue;
            }

            let deadline = gate.next_deadline();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = sleep_until(deadline) => {}
                event = events.next() => match event {
                    Some(Ok(arrival)) => {
                        self.observe(MonitorEvent::Arrival(&arrival));
                        gate.arrival(Instant::now());
                    }
                    Some(Err(e)) => return Err(Error::Stream(e)),
                    None => return Err(Error::StreamEnded),
                },
            }
        }
    }

    /// Pull, filter and fingerprint the current state, invoking the
    /// callback when it differs from the last delivery.
    async fn refresh(&mut self, trigger: Trigger, cancel: &CancellationToken) -> Result<(), Error> {
        self.observe(MonitorEvent::Refreshing(trigger));

        let limit = self.options.pull_timeout;
        let pulled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            pulled = timeout(limit, pull(&self.runtime, &self.options)) => pulled,
        };
        let containers = pulled.map_err(|_| Error::PullTimeout(limit))??;

        let fingerprint = Fingerprint::of_all(&containers);
        if self.cursor == Some(fingerprint) {
            self.observe(MonitorEvent::Unchanged(fingerprint));
            return Ok(());
        }

        self.observe(MonitorEvent::Changed {
            fingerprint,
            count: containers.len(),
        });
        // Advance first so a failing callback is not fed the same state again.
        self.cursor = Some(fingerprint);
        (self.callback)(&containers);
        Ok(())
    }

    fn observe(&self, event: MonitorEvent<'_>) {
        self.options.observer.observe(&event);
    }
}

/// List and inspect every container, keeping those the filter accepts.
/// Containers that vanish between listing and inspection are skipped.
async fn pull<R: ContainerRuntime>(runtime: &R, options: &Options) -> Result<Vec<Container>, Error> {
    let ids = runtime.list().await.map_err(Error::Refresh)?;

    let mut containers = Vec::with_capacity(ids.len());
    for id in ids {
        match runtime.inspect(&id).await {
            Ok(container) => {
                if options.filter.matches(&container) {
                    containers.push(container);
                }
            }
            Err(error) => options.observer.observe(&MonitorEvent::InspectFailed {
                id: &id,
                error: &error,
            }),
        }
    }
    Ok(containers)
}
