// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory client for unit tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::protocol::{ApiResponse, AuthenticatedClient, Method};

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, String),
    ConnectionFailed(String),
    Hang,
}

#[derive(Debug, Default)]
struct Route {
    queued: VecDeque<Reply>,
    fallback: Option<Reply>,
    calls: usize,
    in_flight: usize,
    max_in_flight: usize,
    bodies: Vec<serde_json::Value>,
}

/// Client that answers from per-path scripts and records what it was asked.
///
/// Queued replies are consumed first, then the path's fallback; an unscripted
/// path answers `404`.
#[derive(Debug)]
pub(crate) struct ScriptedClient {
    base_url: String,
    delay: Duration,
    routes: Mutex<HashMap<String, Route>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self {
            base_url: "http://192.0.0.65:8000".to_string(),
            delay: Duration::ZERO,
            routes: Mutex::new(HashMap::new()),
        }
    }

    /// Delays every reply by `delay`.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues one reply for `path`.
    pub(crate) fn respond(&self, path: &str, status: u16, body: impl Into<String>) -> &Self {
        self.route(path, |route| {
            route.queued.push_back(Reply::Status(status, body.into()));
        });
        self
    }

    /// Answers `path` with this reply once the queue is drained.
    pub(crate) fn respond_always(&self, path: &str, status: u16, body: impl Into<String>) -> &Self {
        self.route(path, |route| {
            route.fallback = Some(Reply::Status(status, body.into()));
        });
        self
    }

    /// Queues one transport failure for `path`.
    pub(crate) fn fail(&self, path: &str, message: &str) -> &Self {
        self.route(path, |route| {
            route
                .queued
                .push_back(Reply::ConnectionFailed(message.to_string()));
        });
        self
    }

    /// Makes every request to `path` hang until the caller gives up.
    pub(crate) fn hang(&self, path: &str) -> &Self {
        self.route(path, |route| route.fallback = Some(Reply::Hang));
        self
    }

    /// Number of requests received for `path`.
    pub(crate) fn calls(&self, path: &str) -> usize {
        self.routes.lock().get(path).map_or(0, |route| route.calls)
    }

    /// Highest number of concurrent requests observed for `path`.
    pub(crate) fn max_in_flight(&self, path: &str) -> usize {
        self.routes.lock().get(path).map_or(0, |route| route.max_in_flight)
    }

    /// JSON bodies received for `path`, in order.
    pub(crate) fn bodies(&self, path: &str) -> Vec<serde_json::Value> {
        self.routes
            .lock()
            .get(path)
            .map(|route| route.bodies.clone())
            .unwrap_or_default()
    }

    fn route(&self, path: &str, f: impl FnOnce(&mut Route)) {
        f(self.routes.lock().entry(path.to_string()).or_default());
    }

    fn enter(&self, path: &str, body: Option<&serde_json::Value>) -> Option<Reply> {
        let mut routes = self.routes.lock();
        let route = routes.entry(path.to_string()).or_default();
        route.calls += 1;
        route.in_flight += 1;
        route.max_in_flight = route.max_in_flight.max(route.in_flight);
        if let Some(body) = body {
            route.bodies.push(body.clone());
        }
        route.queued.pop_front().or_else(|| route.fallback.clone())
    }
}

struct InFlight<'a> {
    client: &'a ScriptedClient,
    path: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(route) = self.client.routes.lock().get_mut(&self.path) {
            route.in_flight -= 1;
        }
    }
}

impl AuthenticatedClient for ScriptedClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(
        &self,
        _method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, ProtocolError> {
        let reply = self.enter(path, body);
        let _in_flight = InFlight {
            client: self,
            path: path.to_string(),
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match reply {
            Some(Reply::Status(status, body)) => Ok(ApiResponse::new(status, body)),
            Some(Reply::ConnectionFailed(message)) => Err(ProtocolError::ConnectionFailed(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Ok(ApiResponse::new(404, "")),
        }
    }
}

/// Canned device answers.
pub(crate) mod fixtures {
    use super::ScriptedClient;
    use crate::isapi::Endpoint;

    pub(crate) const USER_CHECK_OK: &str =
        r#"{"UserCheck": {"statusValue": 200, "statusString": "OK"}}"#;

    pub(crate) fn device_info(mac: &str) -> String {
        serde_json::json!({
            "DeviceInfo": {
                "deviceName": "Front Door",
                "deviceID": "48453-000a",
                "model": "DS-K1T671M",
                "serialNumber": "DS-K1T671M20220101V030230ENJ00000000",
                "macAddress": mac,
                "firmwareVersion": "V3.2.30",
                "firmwareReleasedDate": "build 220121",
                "hardwareVersion": "0x0"
            }
        })
        .to_string()
    }

    pub(crate) fn door_capabilities(doors: u32) -> String {
        serde_json::json!({
            "RemoteControlDoor": { "doorNo": { "@min": 1, "@max": doors } }
        })
        .to_string()
    }

    /// A healthy device with `doors` door channels. Every door accepts commands.
    pub(crate) fn ready_client(mac: &str, doors: u32) -> ScriptedClient {
        let client = ScriptedClient::new();
        client
            .respond_always(&Endpoint::UserCheck.path(), 200, USER_CHECK_OK)
            .respond_always(&Endpoint::DeviceInfo.path(), 200, device_info(mac))
            .respond_always(&Endpoint::SessionHeartbeat.path(), 200, "")
            .respond_always(
                &Endpoint::DoorCapabilities.path(),
                200,
                door_capabilities(doors),
            );
        for door in 1..=doors {
            client.respond_always(&Endpoint::RemoteControlDoor(door).path(), 200, "");
        }
        client
    }
}
