// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A fully set up device: session, doors and poll loop.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::Result;
use crate::event::DeviceEvent;
use crate::lock::DoorLock;
use crate::protocol::AuthenticatedClient;
use crate::scheduler::PollScheduler;
use crate::session::{DeviceIdentity, DeviceSession, SessionConfig};
use crate::types::DoorIndex;

/// An access-control device with one [`DoorLock`] per door channel and a
/// running keepalive loop.
///
/// Setup runs in a fixed order:
///
/// 1. initialize the session (credentials, identity)
/// 2. first refresh and door capability query
/// 3. build one lock per reported door
/// 4. start periodic polling
///
/// If any step fails the session is stopped again before the error is
/// returned, so a failed setup leaves nothing running.
///
/// # Examples
///
/// ```no_run
/// use hikvision_isapi::{DoorStation, SessionConfig};
///
/// # async fn example() -> hikvision_isapi::Result<()> {
/// let config = SessionConfig::new("http://192.0.0.65")
///     .with_credentials("admin", "secret")
///     .with_latch_seconds(5);
/// let station = DoorStation::connect(config).await?;
///
/// for lock in station.locks() {
///     println!("{}: {}", lock.name(), lock.state());
/// }
/// if let Some(front) = station.door(1) {
///     front.unlock().await?;
/// }
///
/// station.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DoorStation<C: AuthenticatedClient> {
    session: Arc<DeviceSession<C>>,
    identity: DeviceIdentity,
    locks: Vec<DoorLock<C>>,
    scheduler: PollScheduler<C>,
}

#[cfg(feature = "http")]
impl DoorStation<crate::protocol::HttpClient> {
    /// Connects to a device over HTTP and sets it up.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or any setup step
    /// fails.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        Self::from_session(Arc::new(DeviceSession::http(config)?)).await
    }
}

impl<C: AuthenticatedClient> DoorStation<C> {
    /// Sets up a device reached through `client`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or any setup step
    /// fails.
    pub async fn setup(config: SessionConfig, client: C) -> Result<Self> {
        Self::from_session(Arc::new(DeviceSession::new(config, client)?)).await
    }

    /// Sets up a device on an existing session.
    ///
    /// The session is stopped if setup fails.
    ///
    /// # Errors
    ///
    /// - `Error::Auth`, `Error::Unreachable` or `Error::IdentityUnavailable`
    ///   from initialization
    /// - the error of the first refresh or of the door query
    pub async fn from_session(session: Arc<DeviceSession<C>>) -> Result<Self> {
        Self::bring_up(&session).await.inspect_err(|e| {
            tracing::warn!(base_url = %session.base_url(), error = %e, "Device setup failed");
            session.stop();
        })
    }

    async fn bring_up(session: &Arc<DeviceSession<C>>) -> Result<Self> {
        let identity = session.initialize().await?;

        let scheduler = PollScheduler::new(Arc::clone(session));
        let doors = scheduler.first_refresh().await?;

        let latch = session.config().latch();
        let locks = DoorIndex::all(doors)
            .map(|door| DoorLock::new(session, door, latch))
            .collect::<Result<Vec<_>>>()?;

        scheduler.start()?;

        tracing::info!(
            device = %identity.name(),
            id = %identity.id(),
            doors,
            "Device ready"
        );

        Ok(Self {
            session: Arc::clone(session),
            identity,
            locks,
            scheduler,
        })
    }

    /// Returns the device identity.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Returns the door locks, ordered by door index.
    #[must_use]
    pub fn locks(&self) -> &[DoorLock<C>] {
        &self.locks
    }

    /// Returns the lock for a 1-based door index.
    #[must_use]
    pub fn door(&self, index: u32) -> Option<&DoorLock<C>> {
        self.locks.iter().find(|lock| lock.door().value() == index)
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &Arc<DeviceSession<C>> {
        &self.session
    }

    /// Returns the poll scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler<C> {
        &self.scheduler
    }

    /// Subscribes to session and door events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.session.subscribe()
    }

    /// Stops polling, pending relocks and the session.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.session.stop();
    }
}

impl<C: AuthenticatedClient> Drop for DoorStation<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
