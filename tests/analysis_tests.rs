//! Integration tests for fwlens
//!
//! These tests exercise the full pipeline end to end: textual ingestion,
//! pairwise anomaly classification, packet simulation, and report/CSV
//! export, using complete rule tables rather than hand-built rules.

use fwlens::core::classify::{Relation, analyze};
use fwlens::core::error::{Error, Field};
use fwlens::core::rule::Packet;
use fwlens::core::simulate::first_match;
use fwlens::ingest::{parse_iptables_save, parse_rule_table};
use fwlens::report::{render_json, render_report, rules_to_csv};

/// The running example table: an edge policy with one anomaly of each
/// flavor between specific pairs.
const EDGE_POLICY: &str = "\
# edge filtering policy
protocol,src,s_port,dst,d_port,action
tcp,140.192.37.20,ANY,0.0.0.0/0,HTTP,deny
tcp,140.192.37.0/24,ANY,0.0.0.0/0,HTTP,accept
tcp,0.0.0.0/0,ANY,161.120.33.40,HTTP,accept
tcp,140.192.37.0/24,ANY,161.120.33.40,HTTP,deny
";

#[test]
fn test_generalization_between_host_deny_and_subnet_accept() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    let index = analyze(&rules);
    // Rule 1 covers rule 0 with the opposite action
    assert_eq!(index.relation(0, 1), Some(Relation::Generalization));
}

#[test]
fn test_shadowing_of_late_subnet_deny() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    let index = analyze(&rules);
    // Rules 1 and 2 each cover rule 3 and disagree with its action
    assert_eq!(index.relation(1, 3), Some(Relation::Shadowing));
    assert_eq!(index.relation(2, 3), Some(Relation::Shadowing));
}

#[test]
fn test_correlation_between_partially_overlapping_rules() {
    let rules = parse_rule_table(
        "tcp,140.192.37.0/24,ANY,161.120.33.40,HTTP,deny\n\
         tcp,140.192.37.30,ANY,0.0.0.0/0,HTTP,accept\n",
    )
    .unwrap();
    let index = analyze(&rules);
    assert_eq!(index.relation(0, 1), Some(Relation::Correlation));
}

#[test]
fn test_earlier_rule_flagged_redundant_when_it_covers_a_later_twin() {
    let rules = parse_rule_table(
        "tcp,140.192.37.0/24,ANY,161.120.33.40,{HTTP,HTTPS},accept\n\
         tcp,140.192.37.0/24,ANY,161.120.33.40,HTTP,accept\n",
    )
    .unwrap();
    let index = analyze(&rules);
    assert_eq!(index.relation(0, 1), Some(Relation::RedundancyEarlier));
}

#[test]
fn test_redundancy_suppressed_by_intervening_opposite_action_rule() {
    let rules = parse_rule_table(
        "tcp,140.192.37.0/24,ANY,161.120.33.40,{HTTP,HTTPS},accept\n\
         tcp,140.192.37.20,ANY,161.120.33.40,HTTPS,deny\n\
         tcp,140.192.37.0/24,ANY,161.120.33.40,HTTP,accept\n",
    )
    .unwrap();
    let index = analyze(&rules);
    // Removing rule 0 would hand its HTTPS traffic to the deny in between
    assert_eq!(index.relation(0, 2), None);
}

#[test]
fn test_later_superset_rule_flagged_redundant() {
    let rules = parse_rule_table(
        "tcp,140.192.37.30,ANY,0.0.0.0/0,DNS,accept\n\
         udp,140.192.38.0/24,ANY,161.120.33.40,DNS,deny\n\
         udp,0.0.0.0/0,ANY,161.120.33.0/24,ANY,deny\n",
    )
    .unwrap();
    let index = analyze(&rules);
    assert_eq!(index.relation(1, 2), Some(Relation::RedundancyLater));
}

#[test]
fn test_disjoint_rules_produce_no_relations() {
    let rules = parse_rule_table(
        "tcp,10.0.0.0/8,ANY,0.0.0.0/0,HTTP,accept\n\
         udp,192.168.0.0/16,ANY,0.0.0.0/0,DNS,deny\n",
    )
    .unwrap();
    let index = analyze(&rules);
    assert!(index.is_empty());
}

#[test]
fn test_first_match_stops_at_earliest_matching_rule() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    // Host 140.192.37.20 hits the position-0 deny before the subnet accept
    let packet = Packet::parse("tcp,140.192.37.20,4000,161.120.33.41,80").unwrap();
    let hit = first_match(&packet, &rules).unwrap();
    assert_eq!(hit.position, 0);
    assert_eq!(hit.action.as_str(), "deny");

    // A sibling host falls through to the subnet accept at position 1
    let packet = Packet::parse("tcp,140.192.37.21,4000,161.120.33.41,80").unwrap();
    let hit = first_match(&packet, &rules).unwrap();
    assert_eq!(hit.position, 1);
    assert_eq!(hit.action.as_str(), "accept");
}

#[test]
fn test_unmatched_packet_yields_no_decision() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    let packet = Packet::parse("udp,8.8.8.8,ANY,9.9.9.9,53").unwrap();
    assert!(first_match(&packet, &rules).is_none());
}

#[test]
fn test_iptables_ingestion_feeds_the_same_analysis() {
    let rules = parse_iptables_save(
        "*filter\n\
         :INPUT ACCEPT [0:0]\n\
         -A INPUT -p tcp -s 140.192.37.20 --dport 80 -j DROP\n\
         -A INPUT -p tcp -s 140.192.37.0/24 --dport 80 -j ACCEPT\n\
         COMMIT\n",
    )
    .unwrap();
    let index = analyze(&rules);
    assert_eq!(index.relation(0, 1), Some(Relation::Generalization));
}

#[test]
fn test_csv_export_reanalyzes_identically() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    let index = analyze(&rules);

    let reparsed = parse_rule_table(&rules_to_csv(&rules)).unwrap();
    let reindex = analyze(&reparsed);

    let pairs: Vec<_> = index.iter().collect();
    let repairs: Vec<_> = reindex.iter().collect();
    assert_eq!(pairs, repairs);
}

#[test]
fn test_text_report_names_every_flagged_pair() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    let index = analyze(&rules);
    let report = render_report(&rules, &index);
    for (earlier, later, relation) in index.iter() {
        assert!(report.contains(relation.code()));
        assert!(report.contains(&format!("rule {earlier} / rule {later}")));
    }
}

#[test]
fn test_json_report_is_machine_readable() {
    let rules = parse_rule_table(EDGE_POLICY).unwrap();
    let index = analyze(&rules);
    let json = render_json(&rules, &index).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value["anomalies"].as_array().unwrap().len(),
        index.len()
    );
    assert_eq!(
        value["summary"]["shadowings"].as_u64().unwrap() as usize,
        index.summary().shadowings
    );
}

#[test]
fn test_bad_field_is_rejected_with_position_and_field() {
    let err = parse_rule_table(
        "tcp,140.192.37.0/24,ANY,0.0.0.0/0,HTTP,accept\n\
         tcp,140.192.37.0/24,ANY,not-a-network,HTTP,deny\n",
    )
    .unwrap_err();
    match err {
        Error::Validation {
            position, field, ..
        } => {
            assert_eq!(position, 1);
            assert_eq!(field, Field::Dst);
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_ipv6_rules_analyze_alongside_ipv4() {
    let rules = parse_rule_table(
        "tcp,2001:db8::/32,ANY,::/0,HTTP,accept\n\
         tcp,2001:db8::10,ANY,::/0,HTTP,deny\n\
         tcp,140.192.37.0/24,ANY,0.0.0.0/0,HTTP,accept\n",
    )
    .unwrap();
    let index = analyze(&rules);
    // The v6 host is shadowed by the v6 block; the v4 rule relates to neither
    assert_eq!(index.relation(0, 1), Some(Relation::Shadowing));
    assert_eq!(index.relation(0, 2), None);
    assert_eq!(index.relation(1, 2), None);
}
