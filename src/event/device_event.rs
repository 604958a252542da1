// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::lock::LockState;
use crate::types::{DoorIndex, MacAddress};

/// Events emitted by a device session and its doors.
///
/// Every event carries the device's unique identifier, its MAC address.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::event::DeviceEvent;
/// use hikvision_isapi::lock::LockState;
/// use hikvision_isapi::types::{DoorIndex, MacAddress};
///
/// let device_id: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
/// let event = DeviceEvent::LockStateChanged {
///     device_id,
///     door: DoorIndex::first(),
///     state: LockState::Unlocked,
/// };
/// assert!(event.is_lock_change());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The session resolved the device identity.
    Initialized {
        /// The device identifier.
        device_id: MacAddress,
    },

    /// The device crossed the degraded-availability threshold, or recovered.
    AvailabilityChanged {
        /// The device identifier.
        device_id: MacAddress,
        /// Whether the device is now considered available.
        available: bool,
        /// Consecutive failed polls at the time of the change.
        consecutive_failures: u32,
    },

    /// A door's assumed state changed.
    LockStateChanged {
        /// The device identifier.
        device_id: MacAddress,
        /// The door.
        door: DoorIndex,
        /// The new state.
        state: LockState,
    },

    /// The session was stopped.
    Stopped {
        /// The device identifier.
        device_id: MacAddress,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> MacAddress {
        match self {
            Self::Initialized { device_id }
            | Self::AvailabilityChanged { device_id, .. }
            | Self::LockStateChanged { device_id, .. }
            | Self::Stopped { device_id } => *device_id,
        }
    }

    /// Returns `true` if this is a session lifecycle event.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Initialized { .. } | Self::Stopped { .. })
    }

    /// Returns `true` if this is a door state event.
    #[must_use]
    pub fn is_lock_change(&self) -> bool {
        matches!(self, Self::LockStateChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        MacAddress::from_octets([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])
    }

    #[test]
    fn device_id_for_every_variant() {
        let events = [
            DeviceEvent::Initialized { device_id: mac() },
            DeviceEvent::AvailabilityChanged {
                device_id: mac(),
                available: false,
                consecutive_failures: 3,
            },
            DeviceEvent::Stopped { device_id: mac() },
        ];
        for event in events {
            assert_eq!(event.device_id(), mac());
        }
    }

    #[test]
    fn classification() {
        assert!(DeviceEvent::Stopped { device_id: mac() }.is_lifecycle());
        let availability = DeviceEvent::AvailabilityChanged {
            device_id: mac(),
            available: true,
            consecutive_failures: 0,
        };
        assert!(!availability.is_lifecycle());
        assert!(!availability.is_lock_change());
    }
}
