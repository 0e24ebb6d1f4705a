//! The governance verdict returned to callers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request context passed alongside the query.
///
/// Ordered so canonical serialization (and therefore cache keys) is stable.
pub type Context = BTreeMap<String, serde_json::Value>;

/// Consensus label produced by the ensemble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLabel {
    Comply,
    Violate,
    /// Tie between comply and violate votes.
    Uncertain,
}

impl std::fmt::Display for ConsensusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusLabel::Comply => write!(f, "comply"),
            ConsensusLabel::Violate => write!(f, "violate"),
            ConsensusLabel::Uncertain => write!(f, "uncertain"),
        }
    }
}

/// Result of a single `govern` call.
///
/// Fully materialized before return; never mutated afterwards. A cache hit
/// returns the stored verdict unchanged, including `id` and `decided_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceVerdict {
    /// Unique id for this decision.
    pub id: String,
    /// Majority-vote consensus across decision units.
    pub consensus: ConsensusLabel,
    /// Wilson-calibrated confidence in the consensus, in [0, 1].
    ///
    /// Always the conservative lower bound, never the raw vote fraction.
    pub confidence: f64,
    /// Combined diagnostic score in [0, 1]: out-of-bag compliance weighted
    /// by calibrated confidence.
    pub compliance_score: f64,
    /// Per-unit labels, ordered by unit id.
    pub per_unit_decisions: Vec<ConsensusLabel>,
    /// Signed importance estimate per principle. Negative means promoting
    /// the principle into flagged subsets would reduce violation rates.
    pub principle_importance: BTreeMap<String, f64>,
    /// Ids of units whose out-of-bag violation rate exceeded the threshold.
    pub flagged_units: Vec<usize>,
    /// Human-readable follow-up actions, in rule order.
    pub recommendations: Vec<String>,
    /// Diagnostic records from domain callbacks, keyed by callback name.
    pub domain_diagnostics: BTreeMap<String, serde_json::Value>,
    /// Integrity tag asserting configuration provenance.
    pub constitutional_hash: String,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}
