// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `hikvision_isapi` - Keep a session with Hikvision access-control devices
//! and open their doors over ISAPI.
//!
//! The library covers the part of a door station integration that has real
//! timing behaviour:
//!
//! - **Device session**: credential check, identity resolution by MAC
//!   address, periodic keepalive, clean shutdown
//! - **Door locks**: one per door channel, with an optimistic
//!   `Locked → Unlocking → Unlocked → Locking → Locked` cycle and a
//!   timer-driven relock after a configurable latch delay
//! - **Poll scheduling**: fixed-interval keepalive with availability
//!   tracking
//!
//! # Assumed lock state
//!
//! Devices only accept a remote `open` command and relock on their own.
//! The state reported by a [`DoorLock`] is therefore inferred, never read
//! back from the hardware: a door is reported locked again once its latch
//! delay has elapsed. User interfaces should present it as such
//! ([`DoorLock::is_assumed_state`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use hikvision_isapi::{DoorStation, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> hikvision_isapi::Result<()> {
//!     let config = SessionConfig::new("http://192.0.0.65")
//!         .with_credentials("admin", "secret")
//!         .with_latch_seconds(5);
//!
//!     // Initialize, discover doors and start the keepalive loop
//!     let station = DoorStation::connect(config).await?;
//!     println!("{} ({})", station.identity().name(), station.identity().id());
//!
//!     if let Some(door) = station.door(1) {
//!         door.unlock().await?;
//!         println!("{} is {}", door.name(), door.state());
//!     }
//!
//!     station.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Following state changes
//!
//! ```no_run
//! use hikvision_isapi::{DoorStation, SessionConfig};
//! use hikvision_isapi::event::DeviceEvent;
//!
//! # async fn example() -> hikvision_isapi::Result<()> {
//! let station = DoorStation::connect(SessionConfig::new("http://192.0.0.65")).await?;
//! let mut events = station.subscribe();
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         DeviceEvent::LockStateChanged { door, state, .. } => println!("door {door}: {state}"),
//!         DeviceEvent::AvailabilityChanged { available, .. } => println!("available: {available}"),
//!         DeviceEvent::Stopped { .. } => break,
//!         DeviceEvent::Initialized { .. } => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod isapi;
pub mod lock;
pub mod protocol;
pub mod scheduler;
pub mod session;
mod station;
pub mod types;

pub use error::{ConfigError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{DeviceEvent, EventBus};
pub use lock::{DoorLock, LockState};
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use protocol::{ApiResponse, AuthenticatedClient, Method};
pub use scheduler::{DEFAULT_FAILURE_THRESHOLD, PollHealth, PollScheduler};
pub use session::{DeviceIdentity, DeviceSession, SessionConfig};
pub use station::DoorStation;
pub use types::{DoorIndex, MacAddress};
