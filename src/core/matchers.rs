//! Field-level containment and overlap predicates
//!
//! This module centralizes the primitive set comparisons for each rule
//! field, plus the rule-level combinations the classifier builds on. Each
//! predicate answers a pure question about the match-space of a field:
//!
//! - *covers*: is `a`'s set of admitted values a superset of `b`'s
//!   (equality included)?
//! - *overlaps*: do the two sets intersect at all?
//!
//! Keeping these out of the classifier gives a single source of truth for
//! the field semantics and lets them be tested in isolation.
//!
//! # Examples
//!
//! ```
//! use fwlens::core::matchers::{protocol_covers, protocol_overlaps};
//! use fwlens::core::rule::Protocol;
//!
//! // IP is the wildcard protocol
//! assert!(protocol_covers(Protocol::Ip, Protocol::Tcp));
//! assert!(!protocol_covers(Protocol::Tcp, Protocol::Ip));
//! assert!(protocol_overlaps(Protocol::Tcp, Protocol::Ip));
//! assert!(!protocol_overlaps(Protocol::Tcp, Protocol::Udp));
//! ```

use crate::core::rule::{Action, PortSpec, Protocol, Rule};
use ipnetwork::IpNetwork;

// ═══════════════════════════════════════════════════════════════════════════
// Protocol
// ═══════════════════════════════════════════════════════════════════════════

/// Returns `true` if the two protocol selectors admit a common protocol.
#[inline]
pub fn protocol_overlaps(a: Protocol, b: Protocol) -> bool {
    a == b || a == Protocol::Ip || b == Protocol::Ip
}

/// Returns `true` if selector `a` admits every protocol `b` admits.
#[inline]
pub fn protocol_covers(a: Protocol, b: Protocol) -> bool {
    a == b || a == Protocol::Ip
}

// ═══════════════════════════════════════════════════════════════════════════
// CIDR blocks
// ═══════════════════════════════════════════════════════════════════════════

/// Returns `true` if block `b` is entirely contained in block `a`
/// (equality included).
///
/// Blocks of different address families never cover each other.
#[inline]
pub fn cidr_covers(a: &IpNetwork, b: &IpNetwork) -> bool {
    match (a, b) {
        (IpNetwork::V4(a), IpNetwork::V4(b)) => a.is_supernet_of(*b),
        (IpNetwork::V6(a), IpNetwork::V6(b)) => a.is_supernet_of(*b),
        _ => false,
    }
}

/// Returns `true` if the two blocks share at least one address.
///
/// Blocks of different address families never overlap.
#[inline]
pub fn cidr_overlaps(a: &IpNetwork, b: &IpNetwork) -> bool {
    match (a, b) {
        (IpNetwork::V4(a), IpNetwork::V4(b)) => a.overlaps(*b),
        (IpNetwork::V6(a), IpNetwork::V6(b)) => a.overlaps(*b),
        _ => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Port specifications
// ═══════════════════════════════════════════════════════════════════════════

/// Returns `true` if specification `a` admits every port `b` admits,
/// after alias expansion.
#[inline]
pub fn port_covers(a: &PortSpec, b: &PortSpec) -> bool {
    match (a.numbers(), b.numbers()) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(a), Some(b)) => b.is_subset(&a),
    }
}

/// Returns `true` if the two specifications admit a common port.
#[inline]
pub fn port_overlaps(a: &PortSpec, b: &PortSpec) -> bool {
    match (a.numbers(), b.numbers()) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => !a.is_disjoint(&b),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Actions and whole rules
// ═══════════════════════════════════════════════════════════════════════════

/// Exact action equality.
#[inline]
pub fn action_equals(a: Action, b: Action) -> bool {
    a == b
}

/// Returns `true` if rule `x`'s match-space is a superset of rule `y`'s:
/// protocol, src, `s_port`, dst and `d_port` of `x` each cover the
/// corresponding field of `y`.
pub fn rule_covers(x: &Rule, y: &Rule) -> bool {
    protocol_covers(x.protocol, y.protocol)
        && cidr_covers(&x.src, &y.src)
        && port_covers(&x.s_port, &y.s_port)
        && cidr_covers(&x.dst, &y.dst)
        && port_covers(&x.d_port, &y.d_port)
}

/// Returns `true` if the two rules' match-spaces intersect: all five field
/// pairs overlap.
pub fn rules_overlap(x: &Rule, y: &Rule) -> bool {
    protocol_overlaps(x.protocol, y.protocol)
        && cidr_overlaps(&x.src, &y.src)
        && port_overlaps(&x.s_port, &y.s_port)
        && cidr_overlaps(&x.dst, &y.dst)
        && port_overlaps(&x.d_port, &y.d_port)
}
