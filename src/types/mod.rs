// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! Each type validates its input at construction time.
//!
//! # Types
//!
//! - [`MacAddress`] - Hardware address, normalized to `aa:bb:cc:dd:ee:ff`
//! - [`DoorIndex`] - 1-based door channel index

mod door;
mod mac;

pub use door::DoorIndex;
pub use mac::MacAddress;
