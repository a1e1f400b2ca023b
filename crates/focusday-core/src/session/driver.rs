//! Drives a [`SessionMonitor`] in real time.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::monitor::{SessionMonitor, SessionState};
use super::verdict::evaluate_usage;
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::usage::{BannedApps, UsageLog};

/// Ticks a started monitor until it has a verdict.
///
/// The ticker and the usage query both stop when the cancel signal fires,
/// so no tick or verdict reaches a session that was torn down.
pub struct SessionDriver<L> {
    monitor: SessionMonitor,
    usage_log: L,
    banned: BannedApps,
    tick_interval: Duration,
}

impl<L: UsageLog> SessionDriver<L> {
    pub fn new(monitor: SessionMonitor, usage_log: L, banned: BannedApps) -> Self {
        Self {
            monitor,
            usage_log,
            banned,
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Run to the verdict and hand the monitor back for rating.
    ///
    /// Events go to `events`; a closed receiver is not an error. Returns
    /// [`SessionError::Cancelled`] when `cancel` turns `true` or its sender
    /// is dropped.
    pub async fn run(
        mut self,
        events: mpsc::UnboundedSender<SessionEvent>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<SessionMonitor, SessionError> {
        match self.monitor.state() {
            SessionState::Running | SessionState::Break => {}
            SessionState::Loading => return Err(SessionError::NotLoaded),
            SessionState::Cancelled => return Err(SessionError::Cancelled),
            SessionState::Expired | SessionState::Rated => return Ok(self.monitor),
        }

        let (start_ms, end_ms) = {
            let mut ticker = interval(self.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = cancel.changed() => {
                        if changed.is_err() || *cancel.borrow() {
                            return Err(self.cancelled(&events));
                        }
                    }
                    _ = ticker.tick() => {
                        match self.monitor.tick() {
                            Some(SessionEvent::Expired { window_start_ms, window_end_ms, at }) => {
                                let _ = events.send(SessionEvent::Expired {
                                    window_start_ms,
                                    window_end_ms,
                                    at,
                                });
                                break (window_start_ms, window_end_ms);
                            }
                            Some(event) => {
                                let _ = events.send(event);
                            }
                            None => {
                                let _ = events.send(SessionEvent::Tick {
                                    time_left: self.monitor.time_left(),
                                });
                            }
                        }
                    }
                }
            }
        };

        debug!(start_ms, end_ms, "querying usage log");
        let verdict = tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    return Err(self.cancelled(&events));
                }
                evaluate_usage(&self.usage_log, start_ms, end_ms, &self.banned).await
            }
            verdict = evaluate_usage(&self.usage_log, start_ms, end_ms, &self.banned) => verdict,
        };

        let event = self.monitor.apply_verdict(verdict)?;
        let _ = events.send(event);
        Ok(self.monitor)
    }

    fn cancelled(&mut self, events: &mpsc::UnboundedSender<SessionEvent>) -> SessionError {
        let event = self.monitor.cancel().unwrap_or(SessionEvent::Cancelled {
            time_left: self.monitor.time_left(),
            at: Utc::now(),
        });
        let _ = events.send(event);
        SessionError::Cancelled
    }
}

/// A driver running on the tokio runtime.
///
/// Dropping the handle aborts the task.
pub struct SessionHandle {
    task: Option<JoinHandle<Result<SessionMonitor, SessionError>>>,
    cancel: watch::Sender<bool>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionHandle {
    pub fn spawn<L>(driver: SessionDriver<L>) -> Self
    where
        L: UsageLog + 'static,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(driver.run(event_tx, cancel_rx));
        Self {
            task: Some(task),
            cancel: cancel_tx,
            events: event_rx,
        }
    }

    /// Next event, or `None` once the driver has finished.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Ask the driver to stop. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the driver and take the monitor back.
    pub async fn finish(mut self) -> Result<SessionMonitor, SessionError> {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(Err(SessionError::Cancelled)),
            None => Err(SessionError::Cancelled),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
