//! Recommendation generation.
//!
//! A fixed rule set evaluated in order; rules are not mutually exclusive
//! and each appends zero or more entries.

use quorum_forest::ConsensusOutcome;
use quorum_types::ConsensusLabel;

pub(crate) fn build_recommendations(
    outcome: &ConsensusOutcome,
    confidence_threshold: f64,
    flagged_units: &[usize],
    helpful_principles: &[String],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if outcome.confidence < confidence_threshold {
        recommendations.push(format!(
            "Calibrated confidence {:.2} is below the confidence threshold {:.2}; \
             route for manual review",
            outcome.confidence, confidence_threshold
        ));
    }

    if outcome.label == ConsensusLabel::Violate {
        recommendations
            .push("Consensus indicates a violation; revise the proposed action".to_string());
    }

    if !flagged_units.is_empty() {
        recommendations.push(format!(
            "Investigate principle subsets of flagged units {:?}; their held-out \
             violation rates exceed the threshold",
            flagged_units
        ));
    }

    for principle in helpful_principles {
        recommendations.push(format!(
            "Incorporate principle '{principle}' explicitly to improve compliance"
        ));
    }

    recommendations
}
