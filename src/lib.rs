//! fwlens - Firewall rule lens
//!
//! An analyzer for ordered firewall filtering rule lists: finds pairwise
//! anomalies (generalization, shadowing, redundancy, correlation) and
//! simulates which rule a given packet would match first.
//!
//! # Architecture
//!
//! - [`core`] - Rule model, field matchers, pairwise classifier, anomaly
//!   index, and packet simulation
//! - [`ingest`] - Textual rule-table and iptables-save ingestion into
//!   validated rules
//! - [`report`] - Anomaly report rendering and CSV export
//!
//! # Entry points
//!
//! [`core::classify::analyze`] consumes a normalized, validated, ordered
//! rule sequence and produces the full pairwise anomaly index.
//! [`core::simulate::first_match`] consumes a packet plus the same sequence
//! and produces the matched rule's position and action, or `None`.
//!
//! ```
//! use fwlens::core::classify::{analyze, Relation};
//! use fwlens::core::simulate::first_match;
//! use fwlens::core::rule::Packet;
//! use fwlens::ingest::parse_rule_table;
//!
//! let rules = parse_rule_table(
//!     "tcp,140.192.37.20,ANY,0.0.0.0/0,HTTP,deny\n\
//!      tcp,140.192.37.0/24,ANY,0.0.0.0/0,{HTTP,HTTPS},accept\n",
//! )
//! .unwrap();
//!
//! let index = analyze(&rules);
//! assert_eq!(index.relation(0, 1), Some(Relation::Generalization));
//!
//! let packet = Packet::parse("tcp,140.192.37.20,1234,10.0.0.1,80").unwrap();
//! assert_eq!(first_match(&packet, &rules).unwrap().position, 0);
//! ```

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod core;
pub mod ingest;
pub mod report;

// Re-export commonly used types
pub use self::core::classify::{Relation, analyze};
pub use self::core::error::{Error, Result};
pub use self::core::index::AnomalyIndex;
pub use self::core::rule::{Action, Packet, PortSpec, Protocol, Rule};
pub use self::core::simulate::{RuleMatch, first_match};
