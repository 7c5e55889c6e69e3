//! Pairwise relation classifier
//!
//! For every ordered pair of rules (X at position i, Y at position j, i < j)
//! the classifier combines the field matchers into at most one relation
//! code:
//!
//! | Code | Condition | Meaning |
//! |------|-----------|---------|
//! | GEN  | Y covers X, actions differ | Y generalizes X. Informational, no change needed. |
//! | SHD  | X covers Y, actions differ | Y is shadowed by X and can never match. |
//! | RXD  | X covers Y, actions equal, no qualifying intermediate | X is redundant; remove X. |
//! | RYD  | Y covers X, actions equal | Y is redundant; remove Y. |
//! | COR  | partial overlap only, actions differ | Order-sensitive correlation. |
//!
//! Same-action partial overlap is benign and records no relation, as do
//! pairs whose match-spaces are disjoint. The X-covers-Y checks run before
//! the Y-covers-X checks, so rules with identical match-spaces classify as
//! SHD (different actions) or RXD (equal actions).
//!
//! # The RXD intermediate-rule exception
//!
//! X is not marked redundant if some rule Z between the two overlaps X with
//! a different action: removing X would change the effective action for
//! packets that Z would otherwise intercept differently before reaching Y.
//! The exception applies to RXD only; the other codes carry no such
//! condition. A suppressed RXD records no relation at all — the pair does
//! not fall through to the RYD row even when the match-spaces are identical
//! and Y therefore covers X too.

use crate::core::index::AnomalyIndex;
use crate::core::matchers::{rule_covers, rules_overlap};
use crate::core::rule::Rule;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relation code for one ordered pair of rules.
///
/// At most one code applies per pair; the classifier's decision order makes
/// the table exhaustive and mutually exclusive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Relation {
    /// The later rule generalizes the earlier one (different actions)
    #[serde(rename = "GEN")]
    #[strum(serialize = "GEN")]
    Generalization,
    /// The later rule is shadowed by the earlier one and can never match
    #[serde(rename = "SHD")]
    #[strum(serialize = "SHD")]
    Shadowing,
    /// The earlier rule is redundant and flagged for removal
    #[serde(rename = "RXD")]
    #[strum(serialize = "RXD")]
    RedundancyEarlier,
    /// The later rule is redundant and flagged for removal
    #[serde(rename = "RYD")]
    #[strum(serialize = "RYD")]
    RedundancyLater,
    /// Order-sensitive partial overlap with different actions
    #[serde(rename = "COR")]
    #[strum(serialize = "COR")]
    Correlation,
}

impl Relation {
    /// Returns the short relation code as a static string.
    pub const fn code(self) -> &'static str {
        match self {
            Relation::Generalization => "GEN",
            Relation::Shadowing => "SHD",
            Relation::RedundancyEarlier => "RXD",
            Relation::RedundancyLater => "RYD",
            Relation::Correlation => "COR",
        }
    }

    /// Returns the recommendation text shown alongside this code.
    pub const fn recommendation(self) -> &'static str {
        match self {
            Relation::Generalization => "informational: no change needed",
            Relation::Shadowing => "later rule is unreachable: review rule order or actions",
            Relation::RedundancyEarlier => "earlier rule is redundant: remove it",
            Relation::RedundancyLater => "later rule is redundant: remove it",
            Relation::Correlation => "order-sensitive overlap: verify intended precedence",
        }
    }
}

/// Classifies one ordered pair (X before Y). `intermediates` are the rules
/// strictly between the two, in order; only the RXD branch consults them.
///
/// Returns `None` for disjoint match-spaces and for benign same-action
/// partial overlap.
pub fn classify_pair(x: &Rule, y: &Rule, intermediates: &[&Rule]) -> Option<Relation> {
    if !rules_overlap(x, y) {
        return None;
    }

    let x_covers_y = rule_covers(x, y);
    let y_covers_x = rule_covers(y, x);

    if x.action == y.action {
        if x_covers_y {
            // X redundant, unless an intermediate rule with a different
            // action intercepts part of X's match-space first
            let intercepted = intermediates
                .iter()
                .any(|z| z.action != x.action && rules_overlap(z, x));
            if intercepted {
                return None;
            }
            return Some(Relation::RedundancyEarlier);
        }
        if y_covers_x {
            return Some(Relation::RedundancyLater);
        }
        // Same-action partial overlap is benign
        return None;
    }

    // Actions differ. The earlier rule's coverage is checked first, so an
    // exactly duplicated match-space classifies as shadowing: the later
    // twin is unreachable under first-match evaluation.
    if x_covers_y {
        return Some(Relation::Shadowing);
    }
    if y_covers_x {
        return Some(Relation::Generalization);
    }
    Some(Relation::Correlation)
}

/// Computes the full pairwise anomaly index for an ordered rule list.
///
/// A fresh, stateless recomputation: O(n² · 5) field comparisons, nothing
/// cached across calls. An empty rule list yields an empty index.
///
/// # Examples
///
/// ```
/// use fwlens::core::classify::{analyze, Relation};
/// use fwlens::core::rule::{RawRecord, Rule};
///
/// let records = [
///     ["tcp", "140.192.37.20", "ANY", "0.0.0.0/0", "HTTP", "deny"],
///     ["tcp", "140.192.37.0/24", "ANY", "0.0.0.0/0", "{HTTP,HTTPS}", "accept"],
/// ];
/// let rules: Vec<Rule> = records
///     .iter()
///     .enumerate()
///     .map(|(i, f)| {
///         Rule::from_record(i, &RawRecord {
///             protocol: f[0].into(),
///             src: f[1].into(),
///             s_port: f[2].into(),
///             dst: f[3].into(),
///             d_port: f[4].into(),
///             action: f[5].into(),
///         })
///         .unwrap()
///     })
///     .collect();
///
/// let index = analyze(&rules);
/// assert_eq!(index.relation(0, 1), Some(Relation::Generalization));
/// ```
#[must_use]
pub fn analyze(rules: &[Rule]) -> AnomalyIndex {
    let mut index = AnomalyIndex::default();

    for j in 1..rules.len() {
        for i in 0..j {
            let intermediates: Vec<&Rule> = rules[i + 1..j].iter().collect();
            if let Some(relation) = classify_pair(&rules[i], &rules[j], &intermediates) {
                debug!(
                    earlier = i,
                    later = j,
                    code = relation.code(),
                    "recorded pairwise relation"
                );
                index.record(i, j, relation);
            }
        }
    }

    index
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::core::rule::RawRecord;
    use proptest::prelude::*;

    // Small pools of mutually related values so coverage and overlap both
    // occur often enough to exercise every branch
    prop_compose! {
        fn arb_rule(position: usize)(
            protocol in prop_oneof![Just("ip"), Just("tcp"), Just("udp")],
            src in prop_oneof![
                Just("0.0.0.0/0"),
                Just("10.0.0.0/8"),
                Just("10.1.0.0/16"),
                Just("10.1.2.3"),
                Just("140.192.37.0/24"),
            ],
            dst in prop_oneof![
                Just("0.0.0.0/0"),
                Just("161.120.33.0/24"),
                Just("161.120.33.40"),
            ],
            s_port in prop_oneof![Just("ANY"), Just("1024"), Just("{1024,2048}")],
            d_port in prop_oneof![
                Just("ANY"),
                Just("80"),
                Just("HTTP"),
                Just("{HTTP,HTTPS}"),
                Just("53"),
            ],
            action in prop_oneof![Just("accept"), Just("deny")],
        ) -> Rule {
            Rule::from_record(position, &RawRecord {
                protocol: protocol.into(),
                src: src.into(),
                s_port: s_port.into(),
                dst: dst.into(),
                d_port: d_port.into(),
                action: action.into(),
            })
            .unwrap()
        }
    }

    proptest! {
        #[test]
        fn test_any_relation_implies_overlap(
            x in arb_rule(0),
            y in arb_rule(1),
        ) {
            if classify_pair(&x, &y, &[]).is_some() {
                prop_assert!(rules_overlap(&x, &y));
            }
        }

        #[test]
        fn test_relation_agrees_with_action_comparison(
            x in arb_rule(0),
            y in arb_rule(1),
        ) {
            match classify_pair(&x, &y, &[]) {
                Some(Relation::RedundancyEarlier | Relation::RedundancyLater) => {
                    prop_assert_eq!(x.action, y.action);
                }
                Some(
                    Relation::Generalization
                    | Relation::Shadowing
                    | Relation::Correlation,
                ) => {
                    prop_assert_ne!(x.action, y.action);
                }
                None => {}
            }
        }

        #[test]
        fn test_relation_agrees_with_coverage(
            x in arb_rule(0),
            y in arb_rule(1),
        ) {
            match classify_pair(&x, &y, &[]) {
                Some(Relation::Shadowing | Relation::RedundancyEarlier) => {
                    prop_assert!(rule_covers(&x, &y));
                }
                Some(Relation::Generalization | Relation::RedundancyLater) => {
                    prop_assert!(rule_covers(&y, &x));
                }
                Some(Relation::Correlation) => {
                    prop_assert!(!rule_covers(&x, &y));
                    prop_assert!(!rule_covers(&y, &x));
                }
                None => {}
            }
        }

        #[test]
        fn test_intermediates_only_ever_remove_rxd(
            x in arb_rule(0),
            z in arb_rule(1),
            y in arb_rule(2),
        ) {
            let bare = classify_pair(&x, &y, &[]);
            let screened = classify_pair(&x, &y, &[&z]);
            if bare == screened {
                return Ok(());
            }
            prop_assert_eq!(bare, Some(Relation::RedundancyEarlier));
            prop_assert_eq!(screened, None);
        }

        #[test]
        fn test_analyze_is_deterministic(
            rules in proptest::collection::vec(arb_rule(0), 0..6),
        ) {
            let rules: Vec<Rule> = rules
                .into_iter()
                .enumerate()
                .map(|(i, mut r)| { r.position = i; r })
                .collect();
            prop_assert_eq!(analyze(&rules), analyze(&rules));
        }
    }
}
