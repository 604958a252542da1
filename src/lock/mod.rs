// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door locks and their assumed state.

mod door_lock;
mod state;

pub use door_lock::DoorLock;
pub use state::LockState;
