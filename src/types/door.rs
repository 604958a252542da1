// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door channel index.

use std::fmt;

use crate::error::ValueError;

/// 1-based index of a door channel on an access-control device.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::types::DoorIndex;
///
/// let door = DoorIndex::new(2).unwrap();
/// assert_eq!(door.value(), 2);
///
/// assert!(DoorIndex::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DoorIndex(u32);

impl DoorIndex {
    /// Highest door count accepted from a device. Controllers in the field
    /// top out at a handful of channels.
    pub const MAX: u32 = 32;

    /// Creates a door index.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidDoorIndex` for `0`.
    pub fn new(index: u32) -> Result<Self, ValueError> {
        if index == 0 {
            return Err(ValueError::InvalidDoorIndex(index));
        }
        Ok(Self(index))
    }

    /// The first door.
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    /// Returns every index of a device with `count` doors, in order.
    pub fn all(count: u32) -> impl Iterator<Item = Self> {
        (1..=count).map(Self)
    }

    /// Returns the numeric index.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DoorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
