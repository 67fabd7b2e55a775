// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq, JsonSchema,
)]
pub struct Prefix4 {
    pub value: Ipv4Addr,
    pub length: u8,
}

impl PartialOrd for Prefix4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix4 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix4 {
    /// Create a new `Prefix4` from an IP address and net mask.
    /// The newly created `Prefix4` will have its host bits zeroed upon creation
    /// e.g.
    /// ```
    /// use ipspace::Prefix4;
    /// use std::net::Ipv4Addr;
    /// use std::str::FromStr;
    /// let p4 = Prefix4::new(Ipv4Addr::from_str("10.0.0.10").unwrap(), 24);
    /// assert_eq!(p4.value, Ipv4Addr::from_str("10.0.0.0").unwrap());
    /// ```
    pub fn new(ip: Ipv4Addr, length: u8) -> Self {
        let mut new = Self { value: ip, length };
        new.unset_host_bits();
        new
    }

    /// The network mask as raw bits: `length` leading ones.
    pub fn mask(&self) -> u32 {
        match self.length {
            0 => 0,
            _ => (!0u32) << (32 - self.length),
        }
    }

    pub fn unset_host_bits(&mut self) {
        self.value = Ipv4Addr::from_bits(self.value.to_bits() & self.mask())
    }

    /// Check if an individual address falls inside this prefix.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        ip.to_bits() & self.mask() == self.value.to_bits()
    }

    /// Check if this prefix is contained within another prefix.
    /// Returns true if this prefix is equal to or more specific than the other.
    pub fn within(&self, other: &Prefix4) -> bool {
        // A less specific prefix cannot be within a more specific one
        if self.length < other.length {
            return false;
        }

        if other.length == 0 {
            // /0 contains everything
            return true;
        }

        let mask = other.mask();
        self.value.to_bits() & mask == other.value.to_bits() & mask
    }

    /// The lowest address inside the prefix.
    pub fn first_address(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.value.to_bits() & self.mask())
    }

    /// The highest address inside the prefix.
    pub fn last_address(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.value.to_bits() | !self.mask())
    }
}

impl fmt::Display for Prefix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix4 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) =
            s.split_once('/').ok_or("malformed prefix".to_string())?;

        // Canonicalize so membership tests can compare against the value
        // directly.
        Ok(Self::new(
            value.parse().map_err(|_| "malformed ip addr".to_string())?,
            length.parse().map_err(|_| "malformed length".to_string())?,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::Prefix4;
    use dp_common::{ip, prefix};
    use std::net::Ipv4Addr;

    #[test]
    fn test_prefix_contains() {
        let p: Prefix4 = prefix!("192.0.2.0/24");
        assert!(p.contains(ip!("192.0.2.0")));
        assert!(p.contains(ip!("192.0.2.255")));
        assert!(!p.contains(ip!("192.0.3.0")));

        let all: Prefix4 = prefix!("0.0.0.0/0");
        assert!(all.contains(ip!("255.255.255.255")));

        let host: Prefix4 = prefix!("10.0.0.1/32");
        assert!(host.contains(ip!("10.0.0.1")));
        assert!(!host.contains(ip!("10.0.0.2")));
    }

    #[test]
    fn test_prefix_bounds() {
        let p: Prefix4 = prefix!("10.1.2.0/23");
        assert_eq!(p.first_address(), Ipv4Addr::new(10, 1, 2, 0));
        assert_eq!(p.last_address(), Ipv4Addr::new(10, 1, 3, 255));
    }

    #[test]
    fn test_parse_zeroes_host_bits() {
        let p: Prefix4 = prefix!("10.0.0.10/24");
        assert_eq!(p.value, Ipv4Addr::new(10, 0, 0, 0));
        assert!(p.contains(ip!("10.0.0.10")));
        assert!(p.contains(ip!("10.0.0.200")));
        assert!(!p.contains(ip!("10.0.1.10")));
    }

    #[test]
    fn test_prefix_within() {
        let outer: Prefix4 = prefix!("10.0.0.0/8");
        let inner: Prefix4 = prefix!("10.1.0.0/16");
        assert!(inner.within(&outer));
        assert!(!outer.within(&inner));
        assert!(inner.within(&inner));
    }
}
