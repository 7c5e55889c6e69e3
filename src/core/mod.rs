//! Core analysis functionality
//!
//! This module contains the rule model and the two analysis entry points:
//! pairwise anomaly classification and first-match packet simulation.
//!
//! - [`rule`]: Data structures for rules, packets, and their validation
//! - [`matchers`]: Field-level containment and overlap predicates
//! - [`classify`]: The pairwise relation classifier and [`classify::analyze`]
//! - [`index`]: Aggregated anomaly index and summary counts
//! - [`simulate`]: First-match packet simulation
//! - [`error`]: Error types for rule construction and ingestion
//!
//! Everything here is synchronous, pure computation over caller-owned data:
//! no I/O, no shared state, no caching across calls.

pub mod classify;
pub mod error;
pub mod index;
pub mod matchers;
pub mod rule;
pub mod simulate;
