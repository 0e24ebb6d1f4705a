//! Forest construction via diversity-aware bootstrap sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use quorum_types::{Principle, PrincipleRegistry};

use crate::correlation::CorrelationMatrix;
use crate::error::ForestError;
use crate::unit::DecisionUnit;

/// Floor on a candidate's sampling weight so highly-correlated principles
/// remain selectable.
const MIN_CANDIDATE_WEIGHT: f64 = 0.05;

/// Fixed-size collection of decision units, built once at engine startup.
///
/// Each unit draws `m = floor(sqrt(n)) + 1` distinct principles, biased
/// toward low pairwise correlation so subsets maximize informational
/// diversity. Units are sampled independently; overlap across units is
/// expected. Read-only after construction.
#[derive(Clone, Debug)]
pub struct Forest {
    units: Vec<DecisionUnit>,
    subset_size: usize,
}

impl Forest {
    /// Grow a forest of `unit_count` units over the registry.
    ///
    /// Sampling is seeded, so the same registry, count, and seed always
    /// produce the same forest.
    pub fn grow(
        registry: &PrincipleRegistry,
        matrix: &CorrelationMatrix,
        unit_count: usize,
        seed: u64,
    ) -> Result<Self, ForestError> {
        if registry.is_empty() {
            return Err(quorum_types::RegistryError::EmptyRegistry.into());
        }
        if unit_count == 0 {
            return Err(ForestError::ZeroUnitCount);
        }

        let n = registry.len();
        let subset_size = ((n as f64).sqrt().floor() as usize + 1).min(n);
        let principles: Vec<&Principle> = registry.iter().collect();

        let mut units = Vec::with_capacity(unit_count);
        for id in 0..unit_count {
            let mut rng = StdRng::seed_from_u64(mix(seed, id as u64));
            let indices = sample_subset(&mut rng, n, subset_size, matrix);
            let subset: Vec<Principle> =
                indices.iter().map(|&i| principles[i].clone()).collect();
            let weights: Vec<f64> = subset.iter().map(|_| rng.gen_range(0.5..1.5)).collect();

            debug!(
                unit = id,
                subset = ?subset.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
                "Grew decision unit"
            );
            units.push(DecisionUnit::new(id, subset, weights));
        }

        Ok(Self { units, subset_size })
    }

    pub fn units(&self) -> &[DecisionUnit] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Subset size m used for every unit.
    pub fn subset_size(&self) -> usize {
        self.subset_size
    }

    /// Test-only constructor for hand-built forests.
    #[cfg(test)]
    pub(crate) fn from_units(units: Vec<DecisionUnit>, subset_size: usize) -> Self {
        Self { units, subset_size }
    }
}

/// Select `m` distinct principle indices, down-weighting candidates by
/// their strongest correlation to already-selected members.
fn sample_subset(
    rng: &mut StdRng,
    n: usize,
    m: usize,
    matrix: &CorrelationMatrix,
) -> Vec<usize> {
    if m >= n {
        // Degenerate case: every unit sees the full principle set.
        return (0..n).collect();
    }

    let mut selected: Vec<usize> = Vec::with_capacity(m);
    let mut remaining: Vec<usize> = (0..n).collect();

    while selected.len() < m {
        let weights: Vec<f64> = remaining
            .iter()
            .map(|&candidate| {
                let redundancy = selected
                    .iter()
                    .map(|&s| matrix.get(candidate, s))
                    .fold(0.0_f64, f64::max);
                (1.0 - redundancy).max(MIN_CANDIDATE_WEIGHT)
            })
            .collect();

        let picked = weighted_pick(rng, &weights);
        selected.push(remaining.swap_remove(picked));
    }

    selected
}

/// Index into `weights` drawn proportionally to weight.
fn weighted_pick(rng: &mut StdRng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        target -= w;
        if target <= 0.0 {
            return i;
        }
    }
    weights.len() - 1
}

/// Decorrelate per-unit seeds (splitmix64 finalizer).
fn mix(seed: u64, id: u64) -> u64 {
    let mut z = seed
        .wrapping_add(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(id.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
