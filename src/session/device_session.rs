// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection lifecycle of one device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ProtocolError, Result};
use crate::event::{DeviceEvent, EventBus};
use crate::isapi::{DeviceInfoResponse, DoorCapabilitiesResponse, Endpoint, UserCheckResponse};
use crate::protocol::{ApiResponse, AuthenticatedClient, guarded_request};
use crate::types::{DoorIndex, MacAddress};

use super::{DeviceIdentity, SessionConfig};

/// An authenticated session with one device.
///
/// The session owns the client handle and a cancellation token from which
/// every background activity of the device derives: the poll loop and each
/// door's relock timer. Stopping the session cancels all of them.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new): nothing is sent to the device.
/// 2. [`initialize`](Self::initialize): credential check, identity
///    resolution. The session is running from here on.
/// 3. [`refresh`](Self::refresh): keepalive, usually driven by a
///    [`PollScheduler`](crate::PollScheduler).
/// 4. [`stop`](Self::stop): cancels everything and releases the client.
///
/// A session is never restarted in place. After `stop`, build a new one.
///
/// # Examples
///
/// ```no_run
/// use hikvision_isapi::{DeviceSession, SessionConfig};
///
/// # async fn example() -> hikvision_isapi::Result<()> {
/// let config = SessionConfig::new("http://192.0.0.65").with_credentials("admin", "secret");
/// let session = DeviceSession::http(config)?;
///
/// let identity = session.initialize().await?;
/// println!("{} ({})", identity.name(), identity.id());
///
/// session.refresh().await?;
/// session.stop();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceSession<C: AuthenticatedClient> {
    config: SessionConfig,
    base_url: String,
    client: RwLock<Option<Arc<C>>>,
    identity: OnceLock<DeviceIdentity>,
    running: AtomicBool,
    cancel: CancellationToken,
    events: EventBus,
}

#[cfg(feature = "http")]
impl DeviceSession<crate::protocol::HttpClient> {
    /// Creates a session backed by the reqwest HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn http(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let client = config.to_http_config().into_client()?;
        Self::new(config, client)
    }

    /// Checks that a device is reachable, accepts the credentials and can be
    /// identified, then closes the session again.
    ///
    /// Useful to validate settings before storing them.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`initialize`](Self::initialize).
    pub async fn probe(config: SessionConfig) -> Result<DeviceIdentity> {
        let session = Self::http(config)?;
        let result = session.initialize().await;
        session.stop();
        result
    }
}

impl<C: AuthenticatedClient> DeviceSession<C> {
    /// Creates a session around an already configured client.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(config: SessionConfig, client: C) -> Result<Self> {
        Self::with_shared_client(config, Arc::new(client))
    }

    /// Creates a session around a client handle that the caller also keeps.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn with_shared_client(config: SessionConfig, client: Arc<C>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: client.base_url().to_string(),
            config,
            client: RwLock::new(Some(client)),
            identity: OnceLock::new(),
            running: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            events: EventBus::new(),
        })
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the device base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the device identity, once resolved.
    #[must_use]
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.get()
    }

    /// Returns true between a successful `initialize` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns true once `stop` was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns the event bus shared by the session and its doors.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to session and door events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Returns the client handle.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionStopped` once the handle was released.
    pub fn client(&self) -> Result<Arc<C>> {
        self.client.read().clone().ok_or(Error::SessionStopped)
    }

    /// Token cancelled when the session stops.
    pub(crate) fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Checks credentials and resolves the device identity.
    ///
    /// Only read-only queries are sent. Once an identity is resolved it is
    /// kept for the lifetime of the session, and later calls return it
    /// without contacting the device. A failed call may simply be retried.
    ///
    /// # Errors
    ///
    /// - `Error::Auth` if the credentials are rejected
    /// - `Error::Unreachable` if the device does not answer properly within
    ///   the configured timeout
    /// - `Error::IdentityUnavailable` if no usable MAC address is reported
    /// - `Error::SessionStopped` if the session was stopped
    pub async fn initialize(&self) -> Result<DeviceIdentity> {
        if self.is_stopped() {
            return Err(Error::SessionStopped);
        }
        if let Some(identity) = self.identity.get() {
            return Ok(identity.clone());
        }

        let client = self.client()?;
        self.check_user(&client).await?;
        let identity = self.fetch_identity(&client).await?;

        // A concurrent initialize may have won; the first identity sticks.
        let identity = self.identity.get_or_init(|| identity).clone();

        if self.is_stopped() {
            return Err(Error::SessionStopped);
        }
        self.running.store(true, Ordering::SeqCst);

        tracing::info!(
            device = %identity.name(),
            id = %identity.id(),
            model = %identity.model(),
            "Device initialized"
        );
        self.events.publish(DeviceEvent::Initialized {
            device_id: identity.id(),
        });

        Ok(identity)
    }

    /// Sends one keepalive.
    ///
    /// Never reconnects on its own; the caller decides what to do with a
    /// failure, normally retrying on the next tick.
    ///
    /// # Errors
    ///
    /// - `Error::Transient` on timeout, transport failure or unexpected status
    /// - `Error::Auth` if the device no longer accepts the credentials
    /// - `Error::NotInitialized` before `initialize` succeeded
    /// - `Error::SessionStopped` after `stop`
    pub async fn refresh(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::SessionStopped);
        }
        if self.identity.get().is_none() {
            return Err(Error::NotInitialized);
        }

        let client = self.client()?;
        let response = self
            .send(&client, Endpoint::SessionHeartbeat, None)
            .await
            .map_err(|e| stopped_or(e, Error::Transient))?;

        if response.is_unauthorized() {
            return Err(self.auth_error());
        }
        response.ensure_ok().map_err(Error::Transient)?;

        tracing::trace!(base_url = %self.base_url, "Heartbeat acknowledged");
        Ok(())
    }

    /// Queries how many doors the device can control remotely.
    ///
    /// # Errors
    ///
    /// - `Error::Auth` if the credentials are rejected
    /// - `Error::Unreachable` if the query fails, the capabilities cannot be
    ///   read, or the device reports more than [`DoorIndex::MAX`] doors
    pub async fn discover_doors(&self) -> Result<u32> {
        if self.is_stopped() {
            return Err(Error::SessionStopped);
        }

        let client = self.client()?;
        let response = self
            .send(&client, Endpoint::DoorCapabilities, None)
            .await
            .map_err(|e| self.unreachable(e))?;

        if response.is_unauthorized() {
            return Err(self.auth_error());
        }
        let doors = response
            .ensure_ok()
            .and_then(|response| door_count(&response))
            .map_err(|e| self.unreachable(e))?;

        tracing::info!(base_url = %self.base_url, doors, "Found door channels");
        Ok(doors)
    }

    /// Stops the session.
    ///
    /// Cancels the poll loop, in-flight requests and pending relock timers
    /// without waiting for them, then releases the client handle. Safe to
    /// call repeatedly, and before or without a successful `initialize`.
    pub fn stop(&self) {
        self.cancel.cancel();
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let released = self.client.write().take();

        if released.is_none() {
            return;
        }

        tracing::info!(base_url = %self.base_url, was_running, "Session stopped");
        if let Some(identity) = self.identity.get() {
            self.events.publish(DeviceEvent::Stopped {
                device_id: identity.id(),
            });
        }
    }

    async fn check_user(&self, client: &C) -> Result<()> {
        let response = self
            .send(client, Endpoint::UserCheck, None)
            .await
            .map_err(|e| self.unreachable(e))?;

        if response.is_unauthorized() {
            return Err(self.auth_error());
        }
        let response = response.ensure_ok().map_err(|e| self.unreachable(e))?;

        // Some firmwares answer with an empty or XML body; the status is enough.
        let valid = response
            .parse::<UserCheckResponse>()
            .as_ref()
            .map_or(true, UserCheckResponse::is_valid);
        if !valid {
            return Err(self.auth_error());
        }
        Ok(())
    }

    async fn fetch_identity(&self, client: &C) -> Result<DeviceIdentity> {
        let response = self
            .send(client, Endpoint::DeviceInfo, None)
            .await
            .map_err(|e| self.unreachable(e))?;

        if response.is_unauthorized() {
            return Err(self.auth_error());
        }
        let response = response.ensure_ok().map_err(|e| self.unreachable(e))?;

        let info = response
            .parse::<DeviceInfoResponse>()
            .map_err(|e| self.identity_unavailable(format!("unreadable device info: {e}")))?
            .device_info;

        let raw_mac = info
            .mac_address
            .as_deref()
            .map(str::trim)
            .filter(|mac| !mac.is_empty())
            .ok_or_else(|| self.identity_unavailable("device info has no MAC address"))?;
        let mac = MacAddress::parse(raw_mac).map_err(|e| self.identity_unavailable(e.to_string()))?;

        Ok(DeviceIdentity::new(
            mac,
            info,
            self.base_url.clone(),
            self.config.hostname(),
        ))
    }

    async fn send(
        &self,
        client: &C,
        endpoint: Endpoint,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<ApiResponse, ProtocolError> {
        guarded_request(
            client,
            &self.cancel,
            self.config.timeout(),
            endpoint.method(),
            &endpoint.path(),
            body,
        )
        .await
    }

    fn auth_error(&self) -> Error {
        tracing::warn!(base_url = %self.base_url, "Credentials rejected");
        Error::Auth {
            base_url: self.base_url.clone(),
        }
    }

    fn unreachable(&self, source: ProtocolError) -> Error {
        stopped_or(source, |source| Error::Unreachable {
            base_url: self.base_url.clone(),
            source,
        })
    }

    fn identity_unavailable(&self, reason: impl Into<String>) -> Error {
        Error::IdentityUnavailable {
            base_url: self.base_url.clone(),
            reason: reason.into(),
        }
    }
}

impl<C: AuthenticatedClient> Drop for DeviceSession<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn door_count(response: &ApiResponse) -> std::result::Result<u32, ProtocolError> {
    let doors = response
        .parse::<DoorCapabilitiesResponse>()
        .map_err(|e| ProtocolError::InvalidResponse(format!("unreadable door capabilities: {e}")))?
        .door_count();
    if doors > DoorIndex::MAX {
        return Err(ProtocolError::InvalidResponse(format!(
            "device reports {doors} doors, at most {} are supported",
            DoorIndex::MAX
        )));
    }
    Ok(doors)
}

/// Maps a cancelled request to `SessionStopped`, anything else with `f`.
fn stopped_or(source: ProtocolError, f: impl FnOnce(ProtocolError) -> Error) -> Error {
    match source {
        ProtocolError::Cancelled => Error::SessionStopped,
        other => f(other),
    }
}
