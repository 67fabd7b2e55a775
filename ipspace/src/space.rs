// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::prefix::Prefix4;
use crate::wildcard::IpWildcard;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// What an ACL line does with addresses it matches.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub enum Action {
    Permit,
    Reject,
}

/// One line of an ACL-composed space. With `complement` set the line
/// matches addresses *outside* `space` instead of inside it.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub struct AclLine {
    pub space: IpSpace,
    pub action: Action,
    pub complement: bool,
}

impl AclLine {
    pub fn permitting(space: IpSpace) -> Self {
        Self {
            space,
            action: Action::Permit,
            complement: false,
        }
    }

    pub fn rejecting(space: IpSpace) -> Self {
        Self {
            space,
            action: Action::Reject,
            complement: false,
        }
    }

    fn matches(&self, ip: Ipv4Addr) -> bool {
        self.space.contains(ip) != self.complement
    }
}

/// A symbolic set of IPv4 addresses.
///
/// Membership is total: every address is unambiguously in or out. The
/// `Acl` variant evaluates its lines in declared order, the first matching
/// line decides, and an address matching no line is rejected.
#[derive(
    Debug,
    Clone,
    Default,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub enum IpSpace {
    #[default]
    Empty,
    Universe,
    Wildcard(IpWildcard),
    Acl(Vec<AclLine>),
}

impl IpSpace {
    /// Point containment test.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        match self {
            Self::Empty => false,
            Self::Universe => true,
            Self::Wildcard(w) => w.contains(ip),
            Self::Acl(lines) => {
                for line in lines {
                    if line.matches(ip) {
                        return line.action == Action::Permit;
                    }
                }
                false
            }
        }
    }

    /// Union of an arbitrary number of spaces. Empty members are dropped,
    /// nested unions are flattened, and degenerate results collapse to
    /// `Empty`, `Universe` or the single surviving member.
    pub fn union<I>(spaces: I) -> IpSpace
    where
        I: IntoIterator<Item = IpSpace>,
    {
        let mut members = Vec::new();
        for space in spaces {
            match space {
                Self::Empty => continue,
                Self::Universe => return Self::Universe,
                // A union is itself an all-permit ACL; splice its members
                // rather than nesting.
                Self::Acl(lines)
                    if lines.iter().all(|l| {
                        l.action == Action::Permit && !l.complement
                    }) =>
                {
                    members.extend(lines.into_iter().map(|l| l.space));
                }
                other => members.push(other),
            }
        }
        match members.len() {
            0 => Self::Empty,
            1 => members.pop().unwrap(),
            _ => Self::Acl(members.into_iter().map(AclLine::permitting).collect()),
        }
    }

    /// Intersection, expressed in ACL form: reject the complement of each
    /// member, then permit whatever is left.
    pub fn intersection<I>(spaces: I) -> IpSpace
    where
        I: IntoIterator<Item = IpSpace>,
    {
        let mut lines = Vec::new();
        for space in spaces {
            match space {
                Self::Universe => continue,
                Self::Empty => return Self::Empty,
                other => lines.push(AclLine {
                    space: other,
                    action: Action::Reject,
                    complement: true,
                }),
            }
        }
        match lines.len() {
            0 => Self::Universe,
            1 => lines.pop().unwrap().space,
            _ => {
                lines.push(AclLine::permitting(Self::Universe));
                Self::Acl(lines)
            }
        }
    }

    /// The set of all addresses not in `self`.
    pub fn complement(&self) -> IpSpace {
        match self {
            Self::Empty => Self::Universe,
            Self::Universe => Self::Empty,
            // Unwrap a double complement instead of stacking lines.
            Self::Acl(lines)
                if lines.len() == 1
                    && lines[0].action == Action::Permit
                    && lines[0].complement =>
            {
                lines[0].space.clone()
            }
            other => Self::Acl(vec![AclLine {
                space: other.clone(),
                action: Action::Permit,
                complement: true,
            }]),
        }
    }

    /// Union of the given spaces, as a first-line-wins permit list.
    pub fn permitting<I>(spaces: I) -> IpSpace
    where
        I: IntoIterator<Item = IpSpace>,
    {
        Self::union(spaces)
    }

    /// Start an ACL composition with a leading reject line.
    pub fn rejecting(space: impl Into<IpSpace>) -> AclBuilder {
        AclBuilder::new().then_rejecting(space)
    }

    pub fn is_empty_space(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<IpWildcard> for IpSpace {
    fn from(w: IpWildcard) -> Self {
        Self::Wildcard(w)
    }
}

impl From<Prefix4> for IpSpace {
    fn from(p: Prefix4) -> Self {
        Self::Wildcard(p.into())
    }
}

impl From<Ipv4Addr> for IpSpace {
    fn from(ip: Ipv4Addr) -> Self {
        Self::Wildcard(IpWildcard::host(ip))
    }
}

impl fmt::Display for IpSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Universe => write!(f, "universe"),
            Self::Wildcard(w) => write!(f, "{w}"),
            Self::Acl(lines) => {
                write!(f, "acl [")?;
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let action = match line.action {
                        Action::Permit => "permit",
                        Action::Reject => "reject",
                    };
                    let complement = if line.complement { " not" } else { "" };
                    write!(f, "{action}{complement} {}", line.space)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Ordered permit/reject composition. Lines are evaluated first to last,
/// the first match wins, and anything unmatched is rejected.
#[derive(Debug, Default, Clone)]
pub struct AclBuilder {
    lines: Vec<AclLine>,
}

impl AclBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_permitting(mut self, space: impl Into<IpSpace>) -> Self {
        self.lines.push(AclLine::permitting(space.into()));
        self
    }

    pub fn then_rejecting(mut self, space: impl Into<IpSpace>) -> Self {
        self.lines.push(AclLine::rejecting(space.into()));
        self
    }

    pub fn build(self) -> IpSpace {
        if self.lines.is_empty() {
            return IpSpace::Empty;
        }
        IpSpace::Acl(self.lines)
    }
}

#[cfg(test)]
mod test {
    use super::{AclBuilder, IpSpace};
    use crate::prefix::Prefix4;
    use crate::wildcard::IpWildcard;
    use dp_common::{ip, prefix};
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn space(p: &str) -> IpSpace {
        let p: Prefix4 = p.parse().expect("prefix");
        p.into()
    }

    #[test]
    fn test_empty_and_universe() {
        let samples: [Ipv4Addr; 3] =
            [ip!("0.0.0.0"), ip!("10.1.2.3"), ip!("255.255.255.255")];
        for ip in samples {
            assert!(!IpSpace::Empty.contains(ip));
            assert!(IpSpace::Universe.contains(ip));
        }
        assert_eq!(IpSpace::Empty.complement(), IpSpace::Universe);
        assert_eq!(IpSpace::Universe.complement(), IpSpace::Empty);
    }

    #[test]
    fn test_union_respects_members() {
        let a = space("10.0.0.0/8");
        let b = space("192.0.2.0/24");
        let u = IpSpace::union([a.clone(), b.clone()]);
        let samples: [Ipv4Addr; 4] = [
            ip!("10.255.0.1"),
            ip!("192.0.2.200"),
            ip!("172.16.0.1"),
            ip!("192.0.3.1"),
        ];
        for ip in samples {
            assert_eq!(u.contains(ip), a.contains(ip) || b.contains(ip));
        }
    }

    #[test]
    fn test_union_degenerate_cases() {
        assert_eq!(IpSpace::union([]), IpSpace::Empty);
        assert_eq!(
            IpSpace::union([IpSpace::Empty, IpSpace::Empty]),
            IpSpace::Empty
        );
        let a = space("10.0.0.0/8");
        assert_eq!(IpSpace::union([IpSpace::Empty, a.clone()]), a);
        assert_eq!(
            IpSpace::union([a.clone(), IpSpace::Universe]),
            IpSpace::Universe
        );
    }

    #[test]
    fn test_union_flattens() {
        let a = space("10.0.0.0/8");
        let b = space("192.0.2.0/24");
        let c = space("203.0.113.0/24");
        let nested = IpSpace::union([IpSpace::union([a.clone(), b.clone()]), c.clone()]);
        let flat = IpSpace::union([a, b, c]);
        assert_eq!(nested, flat);
    }

    #[test]
    fn test_complement_respects_members() {
        let a = space("10.0.0.0/8");
        let not_a = a.complement();
        let samples: [Ipv4Addr; 2] = [ip!("10.1.2.3"), ip!("11.1.2.3")];
        for ip in samples {
            assert_eq!(not_a.contains(ip), !a.contains(ip));
        }
        // Double complement collapses structurally.
        assert_eq!(not_a.complement(), a);
    }

    #[test]
    fn test_intersection() {
        let a = space("10.0.0.0/8");
        let b = space("10.1.0.0/16");
        let i = IpSpace::intersection([a.clone(), b.clone()]);
        assert!(i.contains(ip!("10.1.2.3")));
        assert!(!i.contains(ip!("10.2.0.1")));
        assert!(!i.contains(ip!("11.0.0.1")));

        assert_eq!(
            IpSpace::intersection([a.clone(), IpSpace::Empty]),
            IpSpace::Empty
        );
        assert_eq!(IpSpace::intersection([a.clone(), IpSpace::Universe]), a);
        assert_eq!(IpSpace::intersection([]), IpSpace::Universe);
    }

    #[test]
    fn test_acl_first_match_wins() {
        let p24: Prefix4 = prefix!("192.0.2.0/24");
        let host = ip!("192.0.2.1");
        // Reject one host out of a /24, then permit the rest.
        let space = IpSpace::rejecting(host)
            .then_permitting(p24)
            .build();
        assert!(!space.contains(host));
        assert!(space.contains(ip!("192.0.2.2")));
        // Implicit trailing reject.
        assert!(!space.contains(ip!("192.0.3.1")));
    }

    #[test]
    fn test_acl_complement_line() {
        let p24: Prefix4 = prefix!("192.0.2.0/24");
        // "Permit everything outside the /24" via a complement line.
        let space = IpSpace::from(p24).complement();
        assert!(!space.contains(ip!("192.0.2.9")));
        assert!(space.contains(ip!("198.51.100.9")));
    }

    #[test]
    fn test_builder_empty_is_empty() {
        assert_eq!(AclBuilder::new().build(), IpSpace::Empty);
    }

    #[test]
    fn test_default_is_empty() {
        // Derived aggregates start with no addresses, not the universe.
        assert_eq!(IpSpace::default(), IpSpace::Empty);
        assert!(!IpSpace::default().contains(ip!("10.0.0.1")));
    }

    #[test]
    fn test_structural_equality() {
        let mk = || {
            IpSpace::rejecting(IpWildcard::host(ip!("10.0.0.1")))
                .then_permitting(space("10.0.0.0/8"))
                .build()
        };
        assert_eq!(mk(), mk());
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let hash = |s: &IpSpace| {
            let mut h = DefaultHasher::new();
            s.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&mk()), hash(&mk()));
    }
}
