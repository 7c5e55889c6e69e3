//! First-match packet simulation
//!
//! Scans the ordered rule list and returns the first rule the packet
//! satisfies, or `None` when no rule matches. Matching is strict position
//! order: no best-match or longest-prefix reordering, and the scan is O(n)
//! and deterministic. A missing match is an explicit outcome, not an error;
//! callers apply their own default policy.

use crate::core::matchers::protocol_covers;
use crate::core::rule::{Action, Packet, PortSpec, Rule};
use tracing::trace;

/// The rule a simulated packet matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuleMatch {
    /// Position of the matched rule in the ordered list
    pub position: usize,
    /// The matched rule's action
    pub action: Action,
}

/// Returns `true` iff every field of `rule` admits the packet: compatible
/// protocol, source address in the src block, source port satisfying the
/// `s_port` spec, and likewise for the destination side.
#[must_use]
pub fn rule_matches(rule: &Rule, packet: &Packet) -> bool {
    protocol_covers(rule.protocol, packet.protocol)
        && rule.src.contains(packet.src)
        && packet_port_satisfies(packet.s_port, &rule.s_port)
        && rule.dst.contains(packet.dst)
        && packet_port_satisfies(packet.d_port, &rule.d_port)
}

/// Scans the rules in position order and returns the first match.
///
/// # Examples
///
/// ```
/// use fwlens::core::rule::{Packet, RawRecord, Rule};
/// use fwlens::core::simulate::first_match;
///
/// let rule = Rule::from_record(0, &RawRecord {
///     protocol: "tcp".into(),
///     src: "140.192.37.20".into(),
///     s_port: "ANY".into(),
///     dst: "0.0.0.0/0".into(),
///     d_port: "HTTP".into(),
///     action: "deny".into(),
/// })
/// .unwrap();
///
/// let packet = Packet::parse("tcp,140.192.37.20,1234,10.0.0.1,80").unwrap();
/// let matched = first_match(&packet, &[rule]).unwrap();
/// assert_eq!(matched.position, 0);
/// ```
#[must_use]
pub fn first_match(packet: &Packet, rules: &[Rule]) -> Option<RuleMatch> {
    for rule in rules {
        if rule_matches(rule, packet) {
            trace!(position = rule.position, action = rule.action.as_str(), "packet matched");
            return Some(RuleMatch {
                position: rule.position,
                action: rule.action,
            });
        }
    }
    trace!("no rule matched");
    None
}

/// An unspecified packet port (e.g. on an ICMP packet) satisfies only an
/// unconstrained `ANY` specification.
fn packet_port_satisfies(port: Option<u16>, spec: &PortSpec) -> bool {
    match port {
        Some(p) => spec.admits(p),
        None => matches!(spec, PortSpec::Any),
    }
}
