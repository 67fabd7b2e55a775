// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::prefix::Prefix4;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;

/// An address plus a wildcard mask. A set bit in `wildcard` means "don't
/// care"; every clear bit must match `value` exactly. A prefix is the
/// special case where the don't-care bits are a contiguous suffix, but the
/// representation supports arbitrary masks.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq, JsonSchema,
)]
pub struct IpWildcard {
    pub value: Ipv4Addr,
    pub wildcard: u32,
}

impl PartialOrd for IpWildcard {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for IpWildcard {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.wildcard.cmp(&other.wildcard)
    }
}

impl IpWildcard {
    pub fn new(value: Ipv4Addr, wildcard: u32) -> Self {
        // Canonicalize so don't-care bits never leak into the value,
        // keeping structural equality meaningful.
        Self {
            value: Ipv4Addr::from_bits(value.to_bits() & !wildcard),
            wildcard,
        }
    }

    /// A wildcard matching exactly one address.
    pub fn host(ip: Ipv4Addr) -> Self {
        Self::new(ip, 0)
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        (ip.to_bits() ^ self.value.to_bits()) & !self.wildcard == 0
    }

    /// True if this wildcard matches a single address.
    pub fn is_host(&self) -> bool {
        self.wildcard == 0
    }
}

impl From<Prefix4> for IpWildcard {
    fn from(p: Prefix4) -> Self {
        Self::new(p.value, !p.mask())
    }
}

impl From<Ipv4Addr> for IpWildcard {
    fn from(ip: Ipv4Addr) -> Self {
        Self::host(ip)
    }
}

impl fmt::Display for IpWildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.value, Ipv4Addr::from_bits(self.wildcard))
    }
}

#[cfg(test)]
mod test {
    use super::IpWildcard;
    use crate::prefix::Prefix4;
    use dp_common::{ip, prefix};

    #[test]
    fn test_host_wildcard() {
        let w = IpWildcard::host(ip!("192.0.2.1"));
        assert!(w.is_host());
        assert!(w.contains(ip!("192.0.2.1")));
        assert!(!w.contains(ip!("192.0.2.2")));
    }

    #[test]
    fn test_prefix_wildcard() {
        let p: Prefix4 = prefix!("198.51.100.0/24");
        let w = IpWildcard::from(p);
        assert!(w.contains(ip!("198.51.100.77")));
        assert!(!w.contains(ip!("198.51.101.77")));
        assert_eq!(w.to_string(), "198.51.100.0:0.0.0.255");
    }

    #[test]
    fn test_value_canonicalized() {
        // Host bits under the wildcard are dropped, so structurally equal
        // wildcards compare equal regardless of how they were written.
        let a = IpWildcard::new(ip!("10.0.0.9"), 0xff);
        let b = IpWildcard::new(ip!("10.0.0.0"), 0xff);
        assert_eq!(a, b);
        assert!(a.contains(ip!("10.0.0.9")));
    }
}
