// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolved device identity.

use crate::isapi::DeviceInfo;
use crate::types::MacAddress;

/// Identity of a device, resolved once by
/// [`DeviceSession::initialize`](super::DeviceSession::initialize).
///
/// The unique identifier is the device's MAC address in canonical form, so
/// the same device always maps to the same identity regardless of how its
/// firmware formats the address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    id: MacAddress,
    name: String,
    model: String,
    hardware_version: String,
    firmware_version: String,
    firmware_released_date: String,
    serial_number: Option<String>,
    base_url: String,
    hostname: String,
}

impl DeviceIdentity {
    /// Manufacturer reported for every device.
    pub const MANUFACTURER: &'static str = "Hikvision";

    /// Builds an identity from a parsed MAC and the rest of the device info.
    #[must_use]
    pub fn new(
        id: MacAddress,
        info: DeviceInfo,
        base_url: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: info.device_name,
            model: info.model,
            hardware_version: info.hardware_version,
            firmware_version: info.firmware_version,
            firmware_released_date: info.firmware_released_date,
            serial_number: info.serial_number,
            base_url: base_url.into(),
            hostname: hostname.into(),
        }
    }

    /// Returns the unique identifier.
    #[must_use]
    pub fn id(&self) -> MacAddress {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the model designation.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the hardware version.
    #[must_use]
    pub fn hardware_version(&self) -> &str {
        &self.hardware_version
    }

    /// Returns the firmware version.
    #[must_use]
    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    /// Returns the firmware release date.
    #[must_use]
    pub fn firmware_released_date(&self) -> &str {
        &self.firmware_released_date
    }

    /// Returns firmware version and release date as one string,
    /// e.g. `V3.2.30_build 220121`.
    #[must_use]
    pub fn software_version(&self) -> String {
        format!("{}_{}", self.firmware_version, self.firmware_released_date)
    }

    /// Returns the serial number, if reported.
    #[must_use]
    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Returns the base URL, also usable as the configuration URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured host name.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the manufacturer.
    #[must_use]
    pub fn manufacturer(&self) -> &'static str {
        Self::MANUFACTURER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_version_joins_release_date() {
        let info = DeviceInfo {
            device_name: "Lobby".to_string(),
            firmware_version: "V3.2.30".to_string(),
            firmware_released_date: "build 220121".to_string(),
            ..DeviceInfo::default()
        };
        let identity = DeviceIdentity::new(
            MacAddress::from_octets([1, 2, 3, 4, 5, 6]),
            info,
            "http://10.0.0.2:8000",
            "10.0.0.2",
        );

        assert_eq!(identity.software_version(), "V3.2.30_build 220121");
        assert_eq!(identity.id().to_string(), "01:02:03:04:05:06");
        assert_eq!(identity.name(), "Lobby");
        assert_eq!(identity.manufacturer(), "Hikvision");
        assert_eq!(identity.hostname(), "10.0.0.2");
    }
}
