//! # quorum-forest
//!
//! The ensemble core of the quorum governance engine: a fixed collection of
//! independently-sampled decision units, each judging a query against a
//! diverse subset of the principle registry.
//!
//! ## Components
//!
//! - **CorrelationMatrix**: pairwise principle redundancy estimates used to
//!   bias sampling toward informationally diverse subsets.
//! - **PrincipleEvaluator**: the pluggable per-principle judgment
//!   capability; the ensemble logic is independent of how any one principle
//!   is scored.
//! - **DecisionUnit / Forest**: weighted evaluators over principle subsets,
//!   built once from diversity-aware bootstrap samples.
//! - **consensus**: majority vote plus Wilson lower-bound calibration.
//! - **diagnostics**: held-out (out-of-bag) violation-rate estimation and
//!   unit flagging.
//! - **importance**: leave-one-out attribution over excluded principles.
//!
//! Units are pure computation: no I/O, `Send + Sync`, safe to evaluate in
//! parallel.

pub mod consensus;
pub mod correlation;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod forest;
pub mod importance;
pub mod unit;

pub use consensus::{tally, wilson_lower_bound, ConsensusOutcome};
pub use correlation::{CorrelationMatrix, SimilarityMetric, TokenOverlapSimilarity};
pub use diagnostics::{compliance_score, estimate_oob, OobReport};
pub use error::ForestError;
pub use evaluator::{LexiconEvaluator, PrincipleEvaluator};
pub use forest::Forest;
pub use importance::{helpful_principles, importance_scores, HELPFUL_IMPORTANCE_CUTOFF};
pub use unit::{DecisionUnit, UnitDecision};
