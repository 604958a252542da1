// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware MAC address, the basis of every device identifier.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A 48-bit hardware address.
///
/// Devices report their MAC in several notations. All of them normalize to
/// the same canonical form, lowercase and colon-delimited, which is used as
/// the device's unique identifier.
///
/// Accepted notations:
///
/// - `AA:BB:CC:DD:EE:FF` / `aa-bb-cc-dd-ee-ff`
/// - `aabb.ccdd.eeff`
/// - `AABBCCDDEEFF`
///
/// # Examples
///
/// ```
/// use hikvision_isapi::types::MacAddress;
///
/// let mac: MacAddress = "AA-BB-CC-DD-EE-FF".parse().unwrap();
/// assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
///
/// assert!("not a mac".parse::<MacAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates an address from its raw octets.
    #[must_use]
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parses any accepted notation.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidMacAddress` if the input is not a MAC.
    pub fn parse(input: &str) -> Result<Self, ValueError> {
        let invalid = || ValueError::InvalidMacAddress(input.to_string());
        let trimmed = input.trim();

        let hex: String = match trimmed.len() {
            // aa:bb:cc:dd:ee:ff or aa-bb-cc-dd-ee-ff
            17 => {
                let separator = trimmed.as_bytes()[2];
                if separator != b':' && separator != b'-' {
                    return Err(invalid());
                }
                let groups: Vec<&str> = trimmed.split(char::from(separator)).collect();
                if groups.len() != 6 || groups.iter().any(|g| g.len() != 2) {
                    return Err(invalid());
                }
                groups.concat()
            }
            // aabb.ccdd.eeff
            14 => {
                let groups: Vec<&str> = trimmed.split('.').collect();
                if groups.len() != 3 || groups.iter().any(|g| g.len() != 4) {
                    return Err(invalid());
                }
                groups.concat()
            }
            12 => trimmed.to_string(),
            _ => return Err(invalid()),
        };

        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let pair = hex.get(i * 2..i * 2 + 2).ok_or_else(invalid)?;
            *octet = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }

        Ok(Self(octets))
    }
}

impl FromStr for MacAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_stable() {
        let mac = MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(MacAddress::parse(&mac.to_string()).unwrap(), mac);
    }

    #[test]
    fn notations_normalize_to_same_address() {
        let expected = MacAddress::from_octets([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        for input in [
            "AA:BB:CC:DD:EE:FF",
            "aa-bb-cc-dd-ee-ff",
            "aabb.ccdd.eeff",
            "AABBCCDDEEFF",
            "  aa:bb:cc:dd:ee:ff\n",
        ] {
            assert_eq!(MacAddress::parse(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn distinct_addresses_stay_distinct() {
        let a = MacAddress::parse("00:11:22:33:44:55").unwrap();
        let b = MacAddress::parse("00:11:22:33:44:56").unwrap();
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn leading_zeros_are_kept() {
        let mac = MacAddress::from_octets([0, 1, 2, 3, 4, 5]);
        assert_eq!(mac.to_string(), "00:01:02:03:04:05");
    }

    #[test]
    fn rejects_malformed_input() {
        for input in [
            "",
            "aa:bb:cc:dd:ee",
            "aa:bb:cc:dd:ee:gg",
            "aa:bb-cc:dd:ee:ff",
            "aabb.ccdd.ee",
            "aab.bccd.deeff",
            "aa_bb_cc_dd_ee_ff",
            "+abbccddeeff",
        ] {
            assert!(MacAddress::parse(input).is_err(), "{input:?}");
        }
    }
}
