//! A single decision unit ("tree") over a principle subset.

use std::collections::BTreeMap;

use quorum_types::{ConsensusLabel, Context, Principle};

use crate::evaluator::PrincipleEvaluator;

/// Weighted score at or above this is a comply vote.
const DECISION_THRESHOLD: f64 = 0.5;

/// One compliance evaluator over a subset of the principle registry.
///
/// The subset and weights are fixed at forest construction; re-fitting
/// requires rebuilding the whole forest. Evaluation is pure computation.
#[derive(Clone, Debug)]
pub struct DecisionUnit {
    id: usize,
    principles: Vec<Principle>,
    weights: Vec<f64>,
}

/// Output of a single unit evaluation.
#[derive(Clone, Debug)]
pub struct UnitDecision {
    /// Comply or Violate; units never vote Uncertain.
    pub label: ConsensusLabel,
    /// Normalized weighted contribution per subset principle.
    pub contributions: BTreeMap<String, f64>,
    /// Probability-like pair (comply, violate); non-negative, sums to 1.
    pub proba: (f64, f64),
}

impl DecisionUnit {
    pub(crate) fn new(id: usize, principles: Vec<Principle>, weights: Vec<f64>) -> Self {
        debug_assert_eq!(principles.len(), weights.len());
        Self {
            id,
            principles,
            weights,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The unit's principle subset, in selection order.
    pub fn principles(&self) -> &[Principle] {
        &self.principles
    }

    /// Whether `name` is in this unit's subset.
    pub fn covers(&self, name: &str) -> bool {
        self.principles.iter().any(|p| p.name == name)
    }

    /// Evaluate the query against this unit's subset only.
    pub fn evaluate(
        &self,
        query: &str,
        context: &Context,
        evaluator: &dyn PrincipleEvaluator,
    ) -> UnitDecision {
        let total_weight: f64 = self.weights.iter().sum();
        let mut weighted = 0.0;
        let mut contributions = BTreeMap::new();

        for (principle, weight) in self.principles.iter().zip(&self.weights) {
            let score = evaluator.assess(principle, query, context).clamp(0.0, 1.0);
            let contribution = weight * score / total_weight;
            weighted += contribution;
            contributions.insert(principle.name.clone(), contribution);
        }

        let comply = weighted.clamp(0.0, 1.0);
        let label = if comply >= DECISION_THRESHOLD {
            ConsensusLabel::Comply
        } else {
            ConsensusLabel::Violate
        };

        UnitDecision {
            label,
            contributions,
            proba: (comply, 1.0 - comply),
        }
    }
}
