//! Principle importance attribution.
//!
//! For units flagged by the out-of-bag check, estimate how each excluded
//! principle would change the unit's violation rate if it were promoted
//! into the unit's subset. A leave-one-out estimate keeps the attribution
//! deterministic and library-free: removing a principle from the excluded
//! set is the effect of including it in the subset.

use std::collections::BTreeMap;

use quorum_types::{Context, PrincipleRegistry};

use crate::evaluator::PrincipleEvaluator;
use crate::forest::Forest;

/// Importance below this classifies a principle as "helpful": explicitly
/// incorporating it is expected to reduce violation rates.
pub const HELPFUL_IMPORTANCE_CUTOFF: f64 = -0.1;

/// Signed importance estimate per principle, averaged over `target_units`.
///
/// Negative values mean promoting the principle into those units' subsets
/// would lower their out-of-bag violation rate; positive values mean the
/// principle is dragging the rate up for its peers.
pub fn importance_scores(
    forest: &Forest,
    registry: &PrincipleRegistry,
    evaluator: &dyn PrincipleEvaluator,
    query: &str,
    context: &Context,
    target_units: &[usize],
) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for unit in forest
        .units()
        .iter()
        .filter(|u| target_units.contains(&u.id()))
    {
        // Violation score per excluded principle
        let oob: Vec<(&str, f64)> = registry
            .iter()
            .filter(|p| !unit.covers(&p.name))
            .map(|p| {
                let compliance = evaluator.assess(p, query, context).clamp(0.0, 1.0);
                (p.name.as_str(), 1.0 - compliance)
            })
            .collect();

        if oob.is_empty() {
            continue;
        }
        let rate: f64 = oob.iter().map(|(_, v)| v).sum::<f64>() / oob.len() as f64;

        for (name, violation) in &oob {
            // Rate over the excluded set with this principle promoted out
            let remaining = oob.len() - 1;
            let rate_without = if remaining == 0 {
                0.0
            } else {
                (rate * oob.len() as f64 - violation) / remaining as f64
            };
            let delta = rate_without - rate;

            let entry = sums.entry((*name).to_string()).or_insert((0.0, 0));
            entry.0 += delta;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(name, (sum, count))| (name, sum / count as f64))
        .collect()
}

/// Principles whose importance falls below the helpful cutoff, most
/// helpful first.
pub fn helpful_principles(importance: &BTreeMap<String, f64>) -> Vec<String> {
    let mut helpful: Vec<(&String, f64)> = importance
        .iter()
        .filter(|(_, score)| **score < HELPFUL_IMPORTANCE_CUTOFF)
        .map(|(name, score)| (name, *score))
        .collect();
    helpful.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    helpful.into_iter().map(|(name, _)| name.clone()).collect()
}
