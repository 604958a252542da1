// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door lock states.

use std::fmt;

/// Assumed state of a door lock.
///
/// ```text
///            unlock()              200 OK
///   Locked ───────────▶ Unlocking ─────────▶ Unlocked
///     ▲                    │                    │
///     │      any failure   │                    │ latch elapsed / lock()
///     ├────────────────────┘                    ▼
///     └────────────────────────────────────── Locking
/// ```
///
/// Only the `Locked → Unlocking → Unlocked` leg involves the device. The
/// return to `Locked` is applied locally once the latch delay elapses; the
/// device is never asked whether the door actually relocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockState {
    /// The door is assumed locked.
    #[default]
    Locked,
    /// An open command is in flight.
    Unlocking,
    /// The device acknowledged the open command.
    Unlocked,
    /// The latch delay elapsed and the local relock is being applied.
    Locking,
}

impl LockState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocking => "unlocking",
            Self::Unlocked => "unlocked",
            Self::Locking => "locking",
        }
    }

    /// Returns true if the door is assumed locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }

    /// Returns true while a transition is in progress.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        matches!(self, Self::Unlocking | Self::Locking)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
