//! Report rendering and export
//!
//! Turns an [`AnomalyIndex`] and its rule list into the three output
//! surfaces the CLI offers: a human-readable text report, a JSON document
//! for tooling, and a normalized CSV rule table that round-trips through
//! [`crate::ingest::parse_rule_table`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::classify::Relation;
use crate::core::error::Result;
use crate::core::index::{AnomalyIndex, RelationSummary};
use crate::core::rule::{Packet, Rule};
use crate::core::simulate::RuleMatch;

/// One flagged pair in the JSON report.
#[derive(Debug, Clone, Serialize)]
struct AnomalyEntry {
    earlier: usize,
    later: usize,
    relation: Relation,
    recommendation: &'static str,
}

/// Top-level JSON report document.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    rules: &'a [Rule],
    anomalies: Vec<AnomalyEntry>,
    summary: RelationSummary,
}

/// Renders the human-readable anomaly report.
///
/// Flagged pairs are listed in pair order (later rule, then earlier rule),
/// each with both rule records and the recommendation for its code.
#[must_use]
pub fn render_report(rules: &[Rule], index: &AnomalyIndex) -> String {
    let mut out = String::new();
    let summary = index.summary();

    let _ = writeln!(
        out,
        "Analyzed {} rules: {} flagged pairs ({} GEN, {} SHD, {} redundancies, {} COR)",
        rules.len(),
        summary.total(),
        summary.generalizations,
        summary.shadowings,
        summary.redundancies,
        summary.correlations,
    );

    if index.is_empty() {
        let _ = writeln!(out, "\nNo anomalies detected.");
        return out;
    }

    for (earlier, later, relation) in index.iter() {
        let _ = writeln!(
            out,
            "\n{}  rule {earlier} / rule {later}: {}",
            relation.code(),
            relation.recommendation(),
        );
        for position in [earlier, later] {
            if let Some(rule) = rules.get(position) {
                let _ = writeln!(out, "     {position}: {rule}");
            }
        }
    }

    out
}

/// Serializes the rules, flagged pairs and summary counts as pretty JSON.
///
/// # Errors
///
/// Returns [`crate::core::error::Error::Serialization`] if encoding fails.
pub fn render_json(rules: &[Rule], index: &AnomalyIndex) -> Result<String> {
    let anomalies = index
        .iter()
        .map(|(earlier, later, relation)| AnomalyEntry {
            earlier,
            later,
            relation,
            recommendation: relation.recommendation(),
        })
        .collect();

    let report = JsonReport {
        rules,
        anomalies,
        summary: index.summary(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Renders the outcome of one packet simulation.
#[must_use]
pub fn render_simulation(packet: &Packet, outcome: Option<&RuleMatch>) -> String {
    match outcome {
        Some(hit) => format!(
            "packet [{packet}] matched rule {}: {}\n",
            hit.position,
            hit.action.as_str(),
        ),
        None => format!("packet [{packet}] matched no rule\n"),
    }
}

/// Exports the rules as a normalized CSV table with a header row.
///
/// The output parses back through [`crate::ingest::parse_rule_table`] into
/// an equivalent rule list.
#[must_use]
pub fn rules_to_csv(rules: &[Rule]) -> String {
    let mut out = String::from("protocol,src,s_port,dst,d_port,action\n");
    for rule in rules {
        let _ = writeln!(out, "{rule}");
    }
    out
}
