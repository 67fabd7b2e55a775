// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Symbolic IPv4 address-set algebra.
//!
//! An [IpSpace] is an immutable, structurally comparable description of a
//! set of IPv4 addresses. Sets are never enumerated; membership is decided
//! by walking the structure. The ACL form composes permit/reject lines in
//! declared order with first-match-wins semantics and an implicit trailing
//! reject, which is enough to express union, intersection and complement
//! without materializing anything.

pub mod prefix;
pub mod space;
pub mod wildcard;

pub use prefix::Prefix4;
pub use space::{AclBuilder, AclLine, Action, IpSpace};
pub use wildcard::IpWildcard;
