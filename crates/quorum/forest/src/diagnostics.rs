//! Held-out ("out-of-bag") violation estimation.
//!
//! Each unit is cross-checked against the principles it did NOT sample.
//! High violation rates on a unit's excluded principles mean the unit's
//! subset is blind to something relevant; such units are flagged. This is
//! diagnostic only and never changes the consensus label.

use quorum_types::{Context, PrincipleRegistry};
use tracing::debug;

use crate::evaluator::PrincipleEvaluator;
use crate::forest::Forest;

/// Per-unit out-of-bag diagnostics for one query.
#[derive(Clone, Debug)]
pub struct OobReport {
    /// Violation rate per unit, in [0, 1], indexed by unit id.
    pub violation_rates: Vec<f64>,
    /// Units whose rate exceeded the violation threshold.
    pub flagged_units: Vec<usize>,
    /// Mean violation rate across all units.
    pub mean_violation_rate: f64,
}

/// Estimate out-of-bag violation rates for every unit.
///
/// A unit's rate is the mean violation score (1 - compliance) over its
/// excluded principles; a unit with no excluded principles contributes 0.
pub fn estimate_oob(
    forest: &Forest,
    registry: &PrincipleRegistry,
    evaluator: &dyn PrincipleEvaluator,
    query: &str,
    context: &Context,
    violation_threshold: f64,
) -> OobReport {
    let mut violation_rates = Vec::with_capacity(forest.unit_count());
    let mut flagged_units = Vec::new();

    for unit in forest.units() {
        let mut sum = 0.0;
        let mut count = 0usize;
        for principle in registry.iter() {
            if unit.covers(&principle.name) {
                continue;
            }
            let compliance = evaluator.assess(principle, query, context).clamp(0.0, 1.0);
            sum += 1.0 - compliance;
            count += 1;
        }

        let rate = if count == 0 { 0.0 } else { sum / count as f64 };
        if rate > violation_threshold {
            debug!(unit = unit.id(), rate, "Unit flagged by out-of-bag check");
            flagged_units.push(unit.id());
        }
        violation_rates.push(rate);
    }

    let mean_violation_rate = if violation_rates.is_empty() {
        0.0
    } else {
        violation_rates.iter().sum::<f64>() / violation_rates.len() as f64
    };

    OobReport {
        violation_rates,
        flagged_units,
        mean_violation_rate,
    }
}

/// Combine the diagnostic violation rate with the calibrated confidence
/// into the single normalized compliance score.
pub fn compliance_score(mean_violation_rate: f64, calibrated_confidence: f64) -> f64 {
    ((1.0 - mean_violation_rate) * calibrated_confidence).clamp(0.0, 1.0)
}
