// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request bodies sent to the device.

use serde::Serialize;

use crate::error::ParseError;

/// Protocol version tag carried by door commands.
pub const ISAPI_VERSION: &str = "2.0";

/// Namespace tag carried by door commands.
pub const ISAPI_XMLNS: &str = "http://www.isapi.org/ver20/XMLSchema";

/// Body of a remote door control request.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::isapi::RemoteControlDoorRequest;
///
/// let body = RemoteControlDoorRequest::open().to_json().unwrap();
/// assert_eq!(body["RemoteControlDoor"]["cmd"], "open");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteControlDoorRequest {
    /// The door command.
    #[serde(rename = "RemoteControlDoor")]
    pub remote_control_door: RemoteControlDoor,
}

/// Door command parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteControlDoor {
    /// Command name.
    pub cmd: String,
    /// Protocol version tag.
    pub version: String,
    /// Namespace tag.
    pub xmlns: String,
}

impl RemoteControlDoorRequest {
    /// Builds the `open` command, the only door action the device exposes
    /// remotely for this integration.
    #[must_use]
    pub fn open() -> Self {
        Self {
            remote_control_door: RemoteControlDoor {
                cmd: "open".to_string(),
                version: ISAPI_VERSION.to_string(),
                xmlns: ISAPI_XMLNS.to_string(),
            },
        }
    }

    /// Serializes the request into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, ParseError> {
        serde_json::to_value(self).map_err(ParseError::Json)
    }
}
