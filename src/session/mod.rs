// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device session: configuration, identity and connection lifecycle.

mod config;
mod device_session;
mod identity;

pub use config::SessionConfig;
pub use device_session::DeviceSession;
pub use identity::DeviceIdentity;
