//! Pairwise principle redundancy estimation.
//!
//! The correlation matrix is built once from the registry and used only as
//! sampling bias input; it has no external side effects.

use quorum_types::{Principle, PrincipleRegistry};

use crate::error::ForestError;

// ── Similarity Metric ───────────────────────────────────────────────────

/// Pluggable pairwise similarity heuristic over principle metadata.
pub trait SimilarityMetric: Send + Sync {
    /// Similarity in [0, 1] between two distinct principles.
    fn similarity(&self, a: &Principle, b: &Principle) -> f64;
}

/// Jaccard overlap over name tokens.
///
/// Deterministic and metadata-only: `privacy-protection` and
/// `patient-privacy` share the `privacy` token and correlate, while
/// `fairness` and `truthfulness` do not.
pub struct TokenOverlapSimilarity;

impl SimilarityMetric for TokenOverlapSimilarity {
    fn similarity(&self, a: &Principle, b: &Principle) -> f64 {
        let left: std::collections::HashSet<&str> = a.tokens().into_iter().collect();
        let right: std::collections::HashSet<&str> = b.tokens().into_iter().collect();
        let union = left.union(&right).count();
        if union == 0 {
            return 0.0;
        }
        let intersection = left.intersection(&right).count();
        intersection as f64 / union as f64
    }
}

// ── Correlation Matrix ──────────────────────────────────────────────────

/// Symmetric n×n matrix of pairwise principle redundancy, unit diagonal,
/// values in [0, 1].
#[derive(Clone, Debug)]
pub struct CorrelationMatrix {
    n: usize,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Build the matrix from the registry using the given metric.
    pub fn build(
        registry: &PrincipleRegistry,
        metric: &dyn SimilarityMetric,
    ) -> Result<Self, ForestError> {
        let n = registry.len();
        if n == 0 {
            return Err(ForestError::EmptyCorrelationModel);
        }

        let principles: Vec<&Principle> = registry.iter().collect();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = metric.similarity(principles[i], principles[j]).clamp(0.0, 1.0);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        Ok(Self { n, values })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Correlation between principles `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}
