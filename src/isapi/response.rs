// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed responses returned by the device.

use serde::{Deserialize, Deserializer};

/// Response of `GET /ISAPI/Security/userCheck`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserCheckResponse {
    /// The check result, when the device reports one.
    #[serde(rename = "UserCheck")]
    pub user_check: Option<UserCheck>,
}

/// Result of a credential check.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserCheck {
    /// Status code reported inside the body (`200` when valid).
    pub status_value: Option<u16>,
    /// Human readable status.
    pub status_string: Option<String>,
}

impl UserCheckResponse {
    /// Returns true unless the body explicitly reports a failure.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.user_check
            .as_ref()
            .and_then(|check| check.status_value)
            .is_none_or(|status| status == 200)
    }
}

/// Response of `GET /ISAPI/System/deviceInfo`.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::isapi::DeviceInfoResponse;
///
/// let json = r#"{"DeviceInfo": {
///     "deviceName": "Front Door",
///     "model": "DS-K1T671M",
///     "macAddress": "AA:BB:CC:DD:EE:FF",
///     "firmwareVersion": "V3.2.30",
///     "firmwareReleasedDate": "build 220121",
///     "hardwareVersion": "0x0"
/// }}"#;
/// let response: DeviceInfoResponse = serde_json::from_str(json).unwrap();
/// assert_eq!(response.device_info.model, "DS-K1T671M");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfoResponse {
    /// Device information.
    #[serde(rename = "DeviceInfo")]
    pub device_info: DeviceInfo,
}

/// Device identity and firmware information.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// User-assigned device name.
    #[serde(default)]
    pub device_name: String,

    /// Vendor device identifier.
    #[serde(rename = "deviceID", default)]
    pub device_id: Option<String>,

    /// Model designation.
    #[serde(default)]
    pub model: String,

    /// Serial number.
    #[serde(default)]
    pub serial_number: Option<String>,

    /// Hardware MAC address, in whatever form the device reports it.
    #[serde(default)]
    pub mac_address: Option<String>,

    /// Firmware version.
    #[serde(default)]
    pub firmware_version: String,

    /// Firmware release date.
    #[serde(default)]
    pub firmware_released_date: String,

    /// Hardware version.
    #[serde(default)]
    pub hardware_version: String,
}

/// Response of `GET /ISAPI/AccessControl/RemoteControl/door/capabilities`.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::isapi::DoorCapabilitiesResponse;
///
/// let json = r#"{"RemoteControlDoor": {"doorNo": {"@min": 1, "@max": 2}}}"#;
/// let response: DoorCapabilitiesResponse = serde_json::from_str(json).unwrap();
/// assert_eq!(response.door_count(), 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DoorCapabilitiesResponse {
    /// Remote door control capabilities.
    #[serde(rename = "RemoteControlDoor")]
    pub remote_control_door: RemoteControlDoorCapabilities,
}

/// Remote door control capabilities.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteControlDoorCapabilities {
    /// Range of valid door numbers.
    #[serde(rename = "doorNo")]
    pub door_no: DoorNumberRange,
}

/// Range of addressable door numbers. Doors are numbered from 1.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DoorNumberRange {
    /// Highest door number.
    #[serde(rename = "@max", alias = "max", deserialize_with = "number_or_string")]
    pub max: u32,
}

impl DoorCapabilitiesResponse {
    /// Returns the number of addressable doors.
    #[must_use]
    pub fn door_count(&self) -> u32 {
        self.remote_control_door.door_no.max
    }
}

// Some firmwares report capability bounds as strings.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
