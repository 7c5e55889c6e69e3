//! Anomaly index aggregation
//!
//! The [`AnomalyIndex`] collects all pairwise classification results into a
//! lookup keyed by the later rule's position: for each position `j` it holds
//! an ordered mapping of earlier positions `i` to the relation code for the
//! pair (i, j). Pairs with no relation have no entry, and positions with no
//! related predecessors do not appear at all.
//!
//! The index is purely derived data. Consumers (report rendering, summary
//! counts, JSON export) read it without mutating it; any change to the rule
//! list invalidates it wholesale and a fresh `analyze` run rebuilds it.

use crate::core::classify::Relation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pairwise anomaly lookup: later position → (earlier position → code).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyIndex {
    entries: BTreeMap<usize, BTreeMap<usize, Relation>>,
}

impl AnomalyIndex {
    /// Records the relation for the ordered pair (earlier, later).
    pub fn record(&mut self, earlier: usize, later: usize, relation: Relation) {
        self.entries
            .entry(later)
            .or_default()
            .insert(earlier, relation);
    }

    /// Returns the relation for the ordered pair (earlier, later), if any.
    #[must_use]
    pub fn relation(&self, earlier: usize, later: usize) -> Option<Relation> {
        self.entries.get(&later)?.get(&earlier).copied()
    }

    /// Returns the ordered map of earlier related rules for the rule at
    /// `later`, or `None` if it relates to no earlier rule.
    #[must_use]
    pub fn relations_for(&self, later: usize) -> Option<&BTreeMap<usize, Relation>> {
        self.entries.get(&later)
    }

    /// Iterates all recorded pairs as (earlier, later, relation), ordered by
    /// later position then earlier position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Relation)> + '_ {
        self.entries.iter().flat_map(|(later, earlier_map)| {
            earlier_map
                .iter()
                .map(move |(earlier, relation)| (*earlier, *later, *relation))
        })
    }

    /// Total number of recorded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if no pair has a relation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-code totals for dashboards and report headers.
    #[must_use]
    pub fn summary(&self) -> RelationSummary {
        let mut summary = RelationSummary::default();
        for (_, _, relation) in self.iter() {
            match relation {
                Relation::Generalization => summary.generalizations += 1,
                Relation::Shadowing => summary.shadowings += 1,
                Relation::RedundancyEarlier | Relation::RedundancyLater => {
                    summary.redundancies += 1;
                }
                Relation::Correlation => summary.correlations += 1,
            }
        }
        summary
    }
}

/// Aggregate counts over one anomaly index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSummary {
    pub generalizations: usize,
    pub shadowings: usize,
    pub redundancies: usize,
    pub correlations: usize,
}

impl RelationSummary {
    /// Total number of flagged pairs.
    #[must_use]
    pub fn total(self) -> usize {
        self.generalizations + self.shadowings + self.redundancies + self.correlations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let index = AnomalyIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.relation(0, 1), None);
        assert!(index.relations_for(1).is_none());
        assert_eq!(index.summary().total(), 0);
    }

    #[test]
    fn test_record_and_lookup() {
        let mut index = AnomalyIndex::default();
        index.record(0, 3, Relation::Shadowing);
        index.record(2, 3, Relation::Correlation);
        index.record(1, 4, Relation::Generalization);

        assert_eq!(index.len(), 3);
        assert_eq!(index.relation(0, 3), Some(Relation::Shadowing));
        assert_eq!(index.relation(2, 3), Some(Relation::Correlation));
        assert_eq!(index.relation(3, 4), None);

        let for_three = index.relations_for(3).unwrap();
        assert_eq!(for_three.len(), 2);
        // BTreeMap keeps earlier positions ordered
        let earlier: Vec<usize> = for_three.keys().copied().collect();
        assert_eq!(earlier, vec![0, 2]);
    }

    #[test]
    fn test_iter_ordered_by_later_then_earlier() {
        let mut index = AnomalyIndex::default();
        index.record(1, 4, Relation::Generalization);
        index.record(0, 3, Relation::Shadowing);
        index.record(2, 3, Relation::Correlation);

        let pairs: Vec<(usize, usize, Relation)> = index.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (0, 3, Relation::Shadowing),
                (2, 3, Relation::Correlation),
                (1, 4, Relation::Generalization),
            ]
        );
    }

    #[test]
    fn test_summary_counts_both_redundancy_codes() {
        let mut index = AnomalyIndex::default();
        index.record(0, 1, Relation::RedundancyEarlier);
        index.record(0, 2, Relation::RedundancyLater);
        index.record(1, 3, Relation::Shadowing);

        let summary = index.summary();
        assert_eq!(summary.redundancies, 2);
        assert_eq!(summary.shadowings, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_serializes_with_relation_codes() {
        let mut index = AnomalyIndex::default();
        index.record(0, 1, Relation::Generalization);
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.contains("GEN"));
    }
}
