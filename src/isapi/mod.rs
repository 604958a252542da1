// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISAPI endpoints and payloads used by this library.
//!
//! Only the handful of calls needed to keep a session alive and open doors
//! are modelled. All of them use the JSON flavour of ISAPI (`format=json`).
//!
//! | Endpoint | Method | Purpose |
//! |----------|--------|---------|
//! | [`Endpoint::UserCheck`] | `GET` | Validate credentials and reachability |
//! | [`Endpoint::DeviceInfo`] | `GET` | Read identity (MAC, model, firmware) |
//! | [`Endpoint::SessionHeartbeat`] | `PUT` | Keepalive |
//! | [`Endpoint::DoorCapabilities`] | `GET` | Count addressable doors |
//! | [`Endpoint::RemoteControlDoor`] | `PUT` | Send a door command |
//!
//! # Examples
//!
//! ```
//! use hikvision_isapi::isapi::Endpoint;
//! use hikvision_isapi::protocol::Method;
//!
//! let open = Endpoint::RemoteControlDoor(1);
//! assert_eq!(open.method(), Method::Put);
//! assert_eq!(open.path(), "/ISAPI/AccessControl/RemoteControl/door/1");
//! ```

mod command;
mod response;

pub use command::{ISAPI_VERSION, ISAPI_XMLNS, RemoteControlDoor, RemoteControlDoorRequest};
pub use response::{
    DeviceInfo, DeviceInfoResponse, DoorCapabilitiesResponse, DoorNumberRange,
    RemoteControlDoorCapabilities, UserCheck, UserCheckResponse,
};

use crate::protocol::Method;

/// An ISAPI endpoint called by this library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Credential and reachability check.
    UserCheck,
    /// Device identity and firmware information.
    DeviceInfo,
    /// Session keepalive.
    SessionHeartbeat,
    /// Remote door control capabilities.
    DoorCapabilities,
    /// Remote control of a door, by 1-based index.
    RemoteControlDoor(u32),
}

impl Endpoint {
    /// Returns the HTTP method for this endpoint.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::UserCheck | Self::DeviceInfo | Self::DoorCapabilities => Method::Get,
            Self::SessionHeartbeat | Self::RemoteControlDoor(_) => Method::Put,
        }
    }

    /// Returns the path and query, relative to the device base URL.
    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::UserCheck => "/ISAPI/Security/userCheck?format=json".to_string(),
            Self::DeviceInfo => "/ISAPI/System/deviceInfo?format=json".to_string(),
            Self::SessionHeartbeat => "/ISAPI/Security/sessionHeartbeat".to_string(),
            Self::DoorCapabilities => {
                "/ISAPI/AccessControl/RemoteControl/door/capabilities?format=json".to_string()
            }
            Self::RemoteControlDoor(door) => {
                format!("/ISAPI/AccessControl/RemoteControl/door/{door}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_endpoints_use_get() {
        assert_eq!(Endpoint::UserCheck.method(), Method::Get);
        assert_eq!(Endpoint::DeviceInfo.method(), Method::Get);
        assert_eq!(Endpoint::DoorCapabilities.method(), Method::Get);
    }

    #[test]
    fn every_method_has_an_endpoint() {
        let endpoints = [
            Endpoint::UserCheck,
            Endpoint::DeviceInfo,
            Endpoint::SessionHeartbeat,
            Endpoint::DoorCapabilities,
            Endpoint::RemoteControlDoor(1),
        ];
        for method in [Method::Get, Method::Put] {
            assert!(endpoints.iter().any(|e| e.method() == method), "{method:?}");
        }
    }

    #[test]
    fn door_path_uses_index() {
        assert_eq!(
            Endpoint::RemoteControlDoor(2).path(),
            "/ISAPI/AccessControl/RemoteControl/door/2"
        );
    }

    #[test]
    fn heartbeat_is_put() {
        assert_eq!(Endpoint::SessionHeartbeat.method(), Method::Put);
        assert_eq!(
            Endpoint::SessionHeartbeat.path(),
            "/ISAPI/Security/sessionHeartbeat"
        );
    }
}
