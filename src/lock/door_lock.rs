// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remotely opened door with timer-driven relock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ProtocolError, Result};
use crate::event::{DeviceEvent, EventBus};
use crate::isapi::{Endpoint, RemoteControlDoorRequest};
use crate::protocol::{ApiResponse, AuthenticatedClient, guarded_request};
use crate::session::DeviceSession;
use crate::types::{DoorIndex, MacAddress};

use super::LockState;

/// One door channel of an access-control device.
///
/// The device only accepts an `open` command; it pulses the lock relay and
/// relocks on its own. A `DoorLock` therefore tracks an *assumed* state:
/// after a successful open the door is reported [`Unlocked`](LockState::Unlocked),
/// and once the latch delay elapses it is reported
/// [`Locked`](LockState::Locked) again without asking the device. Callers
/// presenting this state should mark it as non-authoritative.
///
/// # Concurrency
///
/// Open commands are single-flight per door: a second `unlock` waits for the
/// first one to finish before sending its own command. At most one relock
/// timer is pending; each successful unlock replaces the previous one.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hikvision_isapi::{DeviceSession, DoorLock, LockState, SessionConfig};
/// use hikvision_isapi::types::DoorIndex;
///
/// # async fn example() -> hikvision_isapi::Result<()> {
/// let config = SessionConfig::new("http://192.0.0.65").with_credentials("admin", "secret");
/// let session = Arc::new(DeviceSession::http(config)?);
/// session.initialize().await?;
///
/// let door = DoorLock::new(&session, DoorIndex::first(), session.config().latch())?;
/// door.unlock().await?;
/// assert_eq!(door.state(), LockState::Unlocked);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DoorLock<C: AuthenticatedClient> {
    door: DoorIndex,
    name: String,
    latch: Duration,
    timeout: Duration,
    client: Arc<C>,
    cancel: CancellationToken,
    shared: Arc<Shared>,
    in_flight: tokio::sync::Mutex<()>,
    relock: Mutex<Option<RelockTimer>>,
    open_body: serde_json::Value,
}

/// State visible to the relock task.
#[derive(Debug)]
struct Shared {
    door: DoorIndex,
    device_id: MacAddress,
    state: watch::Sender<LockState>,
    // Bumped whenever a pending relock is superseded.
    generation: AtomicU64,
    events: EventBus,
}

#[derive(Debug)]
struct RelockTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<C: AuthenticatedClient> DoorLock<C> {
    /// Creates the lock for `door` on an initialized session.
    ///
    /// The lock starts [`Locked`](LockState::Locked). A zero `latch`
    /// disables the automatic relock.
    ///
    /// # Errors
    ///
    /// - `Error::NotInitialized` if the session has no identity yet
    /// - `Error::SessionStopped` if the session was stopped
    pub fn new(session: &DeviceSession<C>, door: DoorIndex, latch: Duration) -> Result<Self> {
        let identity = session.identity().ok_or(Error::NotInitialized)?;
        let client = session.client()?;
        let open_body = RemoteControlDoorRequest::open().to_json()?;
        let (state, _) = watch::channel(LockState::Locked);

        Ok(Self {
            door,
            name: format!("{} door {door}", identity.name()),
            latch,
            timeout: session.config().timeout(),
            client,
            cancel: session.child_token(),
            shared: Arc::new(Shared {
                door,
                device_id: identity.id(),
                state,
                generation: AtomicU64::new(0),
                events: session.events().clone(),
            }),
            in_flight: tokio::sync::Mutex::new(()),
            relock: Mutex::new(None),
            open_body,
        })
    }

    /// Returns the door index.
    #[must_use]
    pub fn door(&self) -> DoorIndex {
        self.door
    }

    /// Returns the display name, `<device name> door <n>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a stable identifier built from the device MAC and door index.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!("hikvision-isapi-{}-{}", self.shared.device_id, self.door)
    }

    /// Returns the latch delay.
    #[must_use]
    pub fn latch(&self) -> Duration {
        self.latch
    }

    /// Returns the current assumed state.
    #[must_use]
    pub fn state(&self) -> LockState {
        *self.shared.state.borrow()
    }

    /// Returns true if the door is assumed locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state().is_locked()
    }

    /// Always true: the state is inferred from commands and timers, never
    /// read back from the device.
    #[must_use]
    pub fn is_assumed_state(&self) -> bool {
        true
    }

    /// Creates a watch receiver for state updates.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<LockState> {
        self.shared.state.subscribe()
    }

    /// Returns true while a relock timer is pending.
    #[must_use]
    pub fn has_pending_relock(&self) -> bool {
        self.relock
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    /// Sends the open command and, on success, arms the relock timer.
    ///
    /// Any pending relock is cancelled first. If the command fails the door
    /// goes back to [`Locked`](LockState::Locked). Dropping the returned
    /// future before it completes has the same effect.
    ///
    /// # Errors
    ///
    /// - `Error::UnlockFailed` if the device rejected the command, did not
    ///   answer in time, or could not be reached
    /// - `Error::SessionStopped` if the session was stopped
    pub async fn unlock(&self) -> Result<()> {
        let _single_flight = self.in_flight.lock().await;
        if self.cancel.is_cancelled() {
            return Err(Error::SessionStopped);
        }

        self.cancel_relock();
        self.shared.set(LockState::Unlocking);
        let revert = RevertOnDrop::new(&self.shared);

        let endpoint = Endpoint::RemoteControlDoor(self.door.value());
        let result = guarded_request(
            &*self.client,
            &self.cancel,
            self.timeout,
            endpoint.method(),
            &endpoint.path(),
            Some(&self.open_body),
        )
        .await
        .and_then(ApiResponse::ensure_ok);
        revert.disarm();

        match result {
            Ok(_) => {
                self.shared.set(LockState::Unlocked);
                tracing::info!(door = %self.door, latch = ?self.latch, "Door unlocked");
                if !self.latch.is_zero() {
                    self.schedule_relock();
                }
                Ok(())
            }
            Err(ProtocolError::Cancelled) => {
                self.shared.set(LockState::Locked);
                Err(Error::SessionStopped)
            }
            Err(source) => {
                self.shared.set(LockState::Locked);
                tracing::warn!(door = %self.door, error = %source, "Door unlock failed");
                Err(Error::UnlockFailed {
                    door: self.door.value(),
                    source,
                })
            }
        }
    }

    /// Same as [`unlock`](Self::unlock).
    ///
    /// # Errors
    ///
    /// See [`unlock`](Self::unlock).
    pub async fn open(&self) -> Result<()> {
        self.unlock().await
    }

    /// Completes the unlock cycle early.
    ///
    /// No command is sent: the device has no remote lock action. With a
    /// latch configured and the door unlocked, the pending relock is applied
    /// now. Otherwise this does nothing.
    pub fn lock(&self) {
        if self.latch.is_zero() || self.state() != LockState::Unlocked {
            tracing::debug!(door = %self.door, state = %self.state(), "Lock request ignored");
            return;
        }

        self.cancel_relock();
        self.shared.relock(self.shared.generation.load(Ordering::SeqCst));
    }

    fn schedule_relock(&self) {
        let cancel = self.cancel.child_token();
        let shared = Arc::clone(&self.shared);
        let generation = shared.generation.load(Ordering::SeqCst);
        let latch = self.latch;

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(latch) => shared.relock(generation),
                }
            }
        });

        let previous = self.relock.lock().replace(RelockTimer { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    fn cancel_relock(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = self.relock.lock().take() {
            timer.cancel.cancel();
        }
    }
}

impl<C: AuthenticatedClient> Drop for DoorLock<C> {
    fn drop(&mut self) {
        if let Some(timer) = self.relock.get_mut().take() {
            timer.cancel.cancel();
        }
    }
}

impl Shared {
    /// Moves to `to`, notifying watchers and subscribers on change.
    fn set(&self, to: LockState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == to {
                return false;
            }
            *state = to;
            true
        });
        if changed {
            self.announce(to);
        }
    }

    /// Applies the local relock unless it was superseded since `generation`.
    fn relock(&self, generation: u64) {
        let locking = self.state.send_if_modified(|state| {
            if *state != LockState::Unlocked
                || self.generation.load(Ordering::SeqCst) != generation
            {
                return false;
            }
            *state = LockState::Locking;
            true
        });
        if !locking {
            return;
        }

        self.announce(LockState::Locking);
        if self.transition(LockState::Locking, LockState::Locked) {
            tracing::debug!(door = %self.door, "Door relocked");
        }
    }

    /// Moves from `from` to `to` only if the door is still in `from`.
    fn transition(&self, from: LockState, to: LockState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state != from {
                return false;
            }
            *state = to;
            true
        });
        if changed {
            self.announce(to);
        }
        changed
    }

    fn announce(&self, state: LockState) {
        tracing::trace!(door = %self.door, %state, "Lock state changed");
        self.events.publish(DeviceEvent::LockStateChanged {
            device_id: self.device_id,
            door: self.door,
            state,
        });
    }
}

/// Puts the door back to `Locked` if an unlock is abandoned mid-flight.
struct RevertOnDrop<'a> {
    shared: Option<&'a Shared>,
}

impl<'a> RevertOnDrop<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    fn disarm(mut self) {
        self.shared = None;
    }
}

impl Drop for RevertOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared {
            shared.set(LockState::Locked);
        }
    }
}
