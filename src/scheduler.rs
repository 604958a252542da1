// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic keepalive polling.
//!
//! A [`PollScheduler`] drives [`DeviceSession::refresh`] on a fixed
//! interval for as long as the session lives. Failed polls are logged and
//! counted, never escalated: the loop keeps its cadence and simply tries
//! again on the next tick. Once [`DEFAULT_FAILURE_THRESHOLD`] polls fail in
//! a row the device is reported unavailable through
//! [`DeviceEvent::AvailabilityChanged`], and available again on the first
//! successful poll.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::event::{DeviceEvent, EventBus};
use crate::protocol::AuthenticatedClient;
use crate::session::DeviceSession;
use crate::types::MacAddress;

/// Consecutive failed polls after which a device is reported unavailable.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Snapshot of the poll loop's view of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollHealth {
    /// Polls completed, successful or not.
    pub polls: u64,
    /// Failed polls since the last success.
    pub consecutive_failures: u32,
    /// False once the failure threshold was reached, until the next success.
    pub available: bool,
}

impl Default for PollHealth {
    fn default() -> Self {
        Self {
            polls: 0,
            consecutive_failures: 0,
            available: true,
        }
    }
}

/// Keeps a device session alive by refreshing it periodically.
///
/// The loop is cancelled when either the scheduler or its session stops. A
/// stopped scheduler cannot be started again.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hikvision_isapi::{DeviceSession, PollScheduler, SessionConfig};
///
/// # async fn example() -> hikvision_isapi::Result<()> {
/// let session = Arc::new(DeviceSession::http(SessionConfig::new("http://192.0.0.65"))?);
/// session.initialize().await?;
///
/// let scheduler = PollScheduler::new(Arc::clone(&session));
/// let doors = scheduler.first_refresh().await?;
/// println!("{doors} doors");
/// scheduler.start()?;
///
/// // ...
/// session.stop();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PollScheduler<C: AuthenticatedClient> {
    session: Arc<DeviceSession<C>>,
    interval: Duration,
    failure_threshold: u32,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    health: Arc<watch::Sender<PollHealth>>,
}

impl<C: AuthenticatedClient> PollScheduler<C> {
    /// Creates a scheduler using the session's keepalive interval.
    #[must_use]
    pub fn new(session: Arc<DeviceSession<C>>) -> Self {
        let (health, _) = watch::channel(PollHealth::default());
        Self {
            interval: session.config().keepalive_interval(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cancel: session.child_token(),
            task: Mutex::new(None),
            health: Arc::new(health),
            session,
        }
    }

    /// Sets how many consecutive failures mark the device unavailable.
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current poll health.
    #[must_use]
    pub fn health(&self) -> PollHealth {
        *self.health.borrow()
    }

    /// Creates a watch receiver for health updates.
    #[must_use]
    pub fn watch_health(&self) -> watch::Receiver<PollHealth> {
        self.health.subscribe()
    }

    /// Returns true while the poll loop is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Performs the fetch that precedes periodic polling: one keepalive,
    /// then the door capability query.
    ///
    /// Returns the number of door channels so callers can build their
    /// locks before the first tick.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step; see
    /// [`DeviceSession::refresh`] and [`DeviceSession::discover_doors`].
    pub async fn first_refresh(&self) -> Result<u32> {
        let result = self.session.refresh().await;
        if let Some(tracker) = self.tracker() {
            tracker.record(&result);
        }
        result?;
        self.session.discover_doors().await
    }

    /// Spawns the poll loop. The first refresh happens one interval from
    /// now. Starting an already running scheduler does nothing.
    ///
    /// # Errors
    ///
    /// - `Error::NotInitialized` before the session resolved its identity
    /// - `Error::SessionStopped` once the session or scheduler was stopped
    pub fn start(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::SessionStopped);
        }
        let tracker = self.tracker().ok_or(Error::NotInitialized)?;

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        tracing::debug!(
            interval = ?self.interval,
            threshold = self.failure_threshold,
            "Starting poll loop"
        );
        *task = Some(tokio::spawn(poll_loop(
            Arc::clone(&self.session),
            self.interval,
            tracker,
            self.cancel.clone(),
        )));
        Ok(())
    }

    /// Stops the poll loop without waiting for an in-flight refresh.
    pub fn stop(&self) {
        self.cancel.cancel();
        if self.task.lock().take().is_some() {
            tracing::debug!("Poll loop stopped");
        }
    }

    fn tracker(&self) -> Option<HealthTracker> {
        let identity = self.session.identity()?;
        Some(HealthTracker {
            device_id: identity.id(),
            threshold: self.failure_threshold,
            health: Arc::clone(&self.health),
            events: self.session.events().clone(),
        })
    }
}

impl<C: AuthenticatedClient> Drop for PollScheduler<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop<C: AuthenticatedClient>(
    session: Arc<DeviceSession<C>>,
    interval: Duration,
    tracker: HealthTracker,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = session.refresh() => result,
                };
                if matches!(result, Err(Error::SessionStopped)) {
                    break;
                }
                tracker.record(&result);
            }
        }
    }
}

/// Counts consecutive failures and announces availability changes.
#[derive(Debug)]
struct HealthTracker {
    device_id: MacAddress,
    threshold: u32,
    health: Arc<watch::Sender<PollHealth>>,
    events: EventBus,
}

impl HealthTracker {
    fn record(&self, result: &Result<()>) {
        let mut changed = None;
        self.health.send_modify(|health| {
            health.polls += 1;
            match result {
                Ok(()) => {
                    if !health.available {
                        changed = Some(health.consecutive_failures);
                    }
                    health.consecutive_failures = 0;
                    health.available = true;
                }
                Err(_) => {
                    health.consecutive_failures = health.consecutive_failures.saturating_add(1);
                    if health.available && health.consecutive_failures >= self.threshold {
                        health.available = false;
                        changed = Some(health.consecutive_failures);
                    }
                }
            }
        });

        if let Err(e) = result {
            tracing::warn!(device = %self.device_id, error = %e, "Keepalive failed");
        }

        let Some(failures) = changed else {
            return;
        };
        let available = result.is_ok();
        if available {
            tracing::info!(device = %self.device_id, after_failures = failures, "Device available again");
        } else {
            tracing::warn!(device = %self.device_id, failures, "Device unavailable");
        }
        self.events.publish(DeviceEvent::AvailabilityChanged {
            device_id: self.device_id,
            available,
            consecutive_failures: if available { 0 } else { failures },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isapi::Endpoint;
    use crate::lock::{DoorLock, LockState};
    use crate::protocol::scripted::{ScriptedClient, fixtures};
    use crate::session::SessionConfig;
    use crate::types::DoorIndex;

    fn heartbeat() -> String {
        Endpoint::SessionHeartbeat.path()
    }

    async fn running_session(
        client: &Arc<ScriptedClient>,
        config: SessionConfig,
    ) -> Arc<DeviceSession<ScriptedClient>> {
        let session =
            Arc::new(DeviceSession::with_shared_client(config, Arc::clone(client)).unwrap());
        session.initialize().await.unwrap();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 1));
        let session = running_session(&client, SessionConfig::default()).await;
        let scheduler = PollScheduler::new(Arc::clone(&session));

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(95)).await;

        assert_eq!(client.calls(&heartbeat()), 3);
        assert_eq!(scheduler.health().polls, 3);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 1));
        let session = running_session(&client, SessionConfig::default()).await;
        let scheduler = PollScheduler::new(session);

        scheduler.start().unwrap();
        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(client.calls(&heartbeat()), 1);
    }

    #[tokio::test]
    async fn start_requires_identity() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 1));
        let session = Arc::new(
            DeviceSession::with_shared_client(SessionConfig::default(), Arc::clone(&client))
                .unwrap(),
        );
        let scheduler = PollScheduler::new(session);

        assert!(matches!(scheduler.start(), Err(Error::NotInitialized)));
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn first_refresh_returns_door_count() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 2));
        let session = running_session(&client, SessionConfig::default()).await;
        let scheduler = PollScheduler::new(session);

        assert_eq!(scheduler.first_refresh().await.unwrap(), 2);
        assert_eq!(client.calls(&heartbeat()), 1);
        assert_eq!(scheduler.health().polls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_timeouts_keep_polling_and_leave_doors_alone() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 2));
        client.hang(&heartbeat());
        let config = SessionConfig::default()
            .with_timeout_seconds(5)
            .with_latch_seconds(0);
        let session = running_session(&client, config).await;
        let unlocked = DoorLock::new(&session, DoorIndex::first(), Duration::ZERO).unwrap();
        let locked =
            DoorLock::new(&session, DoorIndex::new(2).unwrap(), Duration::from_secs(5)).unwrap();
        unlocked.unlock().await.unwrap();
        let mut events = session.subscribe();

        let scheduler = PollScheduler::new(Arc::clone(&session));
        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(100)).await;

        let health = scheduler.health();
        assert_eq!(health.consecutive_failures, 3);
        assert!(!health.available);
        assert!(scheduler.is_running());
        assert_eq!(unlocked.state(), LockState::Unlocked);
        assert_eq!(locked.state(), LockState::Locked);
        assert_eq!(
            events.try_recv().unwrap(),
            DeviceEvent::AvailabilityChanged {
                device_id: session.identity().unwrap().id(),
                available: false,
                consecutive_failures: 3,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_failures() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 1));
        for _ in 0..3 {
            client.respond(&heartbeat(), 503, "busy");
        }
        let session = running_session(&client, SessionConfig::default()).await;
        let mut events = session.subscribe();
        let scheduler = PollScheduler::new(Arc::clone(&session));

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(125)).await;

        let health = scheduler.health();
        assert!(health.available);
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.polls, 4);

        let availability: Vec<bool> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| match event {
                DeviceEvent::AvailabilityChanged { available, .. } => Some(available),
                _ => None,
            })
            .collect();
        assert_eq!(availability, vec![false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_ticks() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 1));
        let session = running_session(&client, SessionConfig::default()).await;
        let scheduler = PollScheduler::new(session);

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(35)).await;
        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(client.calls(&heartbeat()), 1);
        assert!(!scheduler.is_running());
        assert!(matches!(scheduler.start(), Err(Error::SessionStopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn session_stop_cancels_loop_mid_refresh() {
        let client = Arc::new(fixtures::ready_client("aa:bb:cc:dd:ee:ff", 1));
        client.hang(&heartbeat());
        let session = running_session(&client, SessionConfig::default()).await;
        let scheduler = PollScheduler::new(Arc::clone(&session));
        let mut health = scheduler.watch_health();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(40)).await;
        session.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(client.calls(&heartbeat()), 1);
        assert!(!scheduler.is_running());
        assert!(!health.has_changed().unwrap());
    }
}
