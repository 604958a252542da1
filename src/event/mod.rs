// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for session and door changes.
//!
//! The [`EventBus`] uses tokio's broadcast channel so that a host application
//! can follow lock transitions and availability changes without polling.
//!
//! # Examples
//!
//! ```
//! use hikvision_isapi::event::{DeviceEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::Stopped {
//!     device_id: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
//! });
//! ```

mod device_event;
mod event_bus;

pub use device_event::DeviceEvent;
pub use event_bus::EventBus;
