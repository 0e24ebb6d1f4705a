//! Consensus aggregation and confidence calibration.
//!
//! Raw vote fractions overstate certainty for small ensembles: 3 of 3 votes
//! is weaker evidence than 30 of 30. The Wilson lower bound shrinks the
//! reported confidence toward what the sample size actually supports.

use quorum_types::ConsensusLabel;

/// z-score for a 95% lower confidence bound.
const WILSON_Z: f64 = 1.96;

/// Aggregated ensemble outcome.
#[derive(Clone, Debug)]
pub struct ConsensusOutcome {
    pub label: ConsensusLabel,
    /// Vote fraction for the winning label. Diagnostic only; never reported
    /// as the verdict confidence.
    pub raw_confidence: f64,
    /// Wilson lower bound of the raw confidence. Always <= raw.
    pub confidence: f64,
}

/// Majority vote over unit labels; ties resolve to `Uncertain`.
pub fn tally(labels: &[ConsensusLabel]) -> ConsensusOutcome {
    let total = labels.len();
    let comply = labels
        .iter()
        .filter(|l| **l == ConsensusLabel::Comply)
        .count();
    let violate = total - comply;

    let (label, winning) = match comply.cmp(&violate) {
        std::cmp::Ordering::Greater => (ConsensusLabel::Comply, comply),
        std::cmp::Ordering::Less => (ConsensusLabel::Violate, violate),
        std::cmp::Ordering::Equal => (ConsensusLabel::Uncertain, comply),
    };

    let raw_confidence = if total == 0 {
        0.0
    } else {
        winning as f64 / total as f64
    };

    ConsensusOutcome {
        label,
        raw_confidence,
        confidence: wilson_lower_bound(raw_confidence, total),
    }
}

/// Wilson score interval lower bound for proportion `p_hat` over `n` trials.
///
/// Satisfies `wilson_lower_bound(p, n) <= p` for all n >= 1 and converges
/// toward `p_hat` as n grows.
pub fn wilson_lower_bound(p_hat: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = p_hat.clamp(0.0, 1.0);
    let n = n as f64;
    let z2 = WILSON_Z * WILSON_Z;

    let denominator = 1.0 + z2 / n;
    let center = p + z2 / (2.0 * n);
    let margin = WILSON_Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    ((center - margin) / denominator).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use ConsensusLabel::{Comply, Violate};

    #[test]
    fn unanimous_comply_wins() {
        let outcome = tally(&[Comply, Comply, Comply]);
        assert_eq!(outcome.label, Comply);
        assert_eq!(outcome.raw_confidence, 1.0);
    }

    #[test]
    fn majority_violate_wins() {
        let outcome = tally(&[Violate, Violate, Comply]);
        assert_eq!(outcome.label, Violate);
        assert!((outcome.raw_confidence - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn tie_resolves_to_uncertain() {
        let outcome = tally(&[Comply, Violate, Comply, Violate]);
        assert_eq!(outcome.label, ConsensusLabel::Uncertain);
        assert_eq!(outcome.raw_confidence, 0.5);
    }

    #[test]
    fn calibration_shrinks_small_samples() {
        // 3/3 votes: raw 1.0, calibrated well below
        let outcome = tally(&[Comply, Comply, Comply]);
        assert!(outcome.confidence < 0.5);
        assert!(outcome.confidence > 0.3);
    }

    #[test]
    fn calibration_converges_with_sample_size() {
        let small = wilson_lower_bound(0.9, 10);
        let large = wilson_lower_bound(0.9, 10_000);
        assert!(large > small);
        assert!((0.9 - large) < 0.01);
    }

    proptest! {
        #[test]
        fn lower_bound_never_exceeds_raw(p in 0.0f64..=1.0, n in 1usize..500) {
            let lb = wilson_lower_bound(p, n);
            prop_assert!(lb <= p + 1e-12);
            prop_assert!((0.0..=1.0).contains(&lb));
        }

        #[test]
        fn tally_confidence_is_calibrated(votes in proptest::collection::vec(
            prop_oneof![Just(Comply), Just(Violate)], 1..64)) {
            let outcome = tally(&votes);
            prop_assert!(outcome.confidence <= outcome.raw_confidence + 1e-12);
            prop_assert!((0.0..=1.0).contains(&outcome.confidence));
        }
    }
}
