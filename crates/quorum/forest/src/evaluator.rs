//! The per-principle judgment capability.
//!
//! How a single principle is judged is deployment-specific (keyword
//! heuristics here, a classifier elsewhere). The ensemble only depends on
//! this trait; swapping the judgment function never touches forest logic.

use std::collections::HashMap;

use quorum_types::{Context, Principle};

/// Judges a query against one principle.
///
/// Implementations must be pure computation, with no network or blocking I/O,
/// so units stay parallelizable, and deterministic for a fixed input so
/// cached verdicts stay reproducible.
pub trait PrincipleEvaluator: Send + Sync {
    /// Compliance score in [0, 1]; 1.0 is fully compliant, 0.0 is a clear
    /// violation of this principle.
    fn assess(&self, principle: &Principle, query: &str, context: &Context) -> f64;
}

/// Weighted risk-term lexicon per principle.
///
/// Each matched term subtracts its weight from a starting score of 1.0.
/// Terms are matched case-insensitively against the query and against
/// string values in the context.
pub struct LexiconEvaluator {
    lexicon: HashMap<String, Vec<(String, f64)>>,
    /// Applied to every principle in addition to its own terms.
    generic_terms: Vec<(String, f64)>,
}

impl LexiconEvaluator {
    /// Empty lexicon; every assessment scores 1.0 until terms are added.
    pub fn new() -> Self {
        Self {
            lexicon: HashMap::new(),
            generic_terms: Vec::new(),
        }
    }

    /// Lexicon covering the baseline principle set plus the built-in domain
    /// principles.
    pub fn with_defaults() -> Self {
        let mut evaluator = Self::new();
        evaluator.generic_terms = terms(&[("exploit", 0.4), ("bypass", 0.3), ("illegal", 0.5)]);

        let entries: [(&str, &[(&str, f64)]); 12] = [
            (
                "harm-prevention",
                &[("attack", 0.5), ("weapon", 0.4), ("destroy", 0.3), ("harm", 0.4)],
            ),
            (
                "privacy-protection",
                &[
                    ("ssn", 0.6),
                    ("password", 0.5),
                    ("medical record", 0.4),
                    ("home address", 0.3),
                ],
            ),
            (
                "truthfulness",
                &[("fabricate", 0.5), ("mislead", 0.4), ("fake", 0.3)],
            ),
            ("fairness", &[("discriminate", 0.6), ("biased", 0.3)]),
            ("transparency", &[("conceal", 0.4), ("covert", 0.3)]),
            (
                "accountability",
                &[("untraceable", 0.4), ("deniable", 0.3)],
            ),
            ("user-autonomy", &[("coerce", 0.5), ("manipulate", 0.4)]),
            (
                "data-minimization",
                &[("collect everything", 0.5), ("bulk data", 0.4)],
            ),
            (
                "patient-privacy",
                &[("patient", 0.2), ("diagnosis", 0.3), ("medical record", 0.5)],
            ),
            (
                "clinical-accuracy",
                &[("dosage", 0.3), ("unverified treatment", 0.5)],
            ),
            (
                "transaction-integrity",
                &[("tamper", 0.5), ("backdate", 0.4)],
            ),
            ("fraud-prevention", &[("launder", 0.6), ("fraud", 0.5)]),
        ];
        for (principle, list) in entries {
            evaluator.lexicon.insert(principle.to_string(), terms(list));
        }
        evaluator
    }

    /// Add or extend the term list for one principle.
    pub fn with_term(
        mut self,
        principle: impl Into<String>,
        term: impl Into<String>,
        weight: f64,
    ) -> Self {
        let term: String = term.into();
        self.lexicon
            .entry(principle.into())
            .or_default()
            .push((term.to_lowercase(), weight));
        self
    }

    fn searchable_text(query: &str, context: &Context) -> String {
        let mut text = query.to_lowercase();
        for value in context.values() {
            if let Some(s) = value.as_str() {
                text.push(' ');
                text.push_str(&s.to_lowercase());
            }
        }
        text
    }
}

impl Default for LexiconEvaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PrincipleEvaluator for LexiconEvaluator {
    fn assess(&self, principle: &Principle, query: &str, context: &Context) -> f64 {
        let text = Self::searchable_text(query, context);
        let mut score = 1.0_f64;

        if let Some(list) = self.lexicon.get(&principle.name) {
            for (term, weight) in list {
                if text.contains(term.as_str()) {
                    score -= weight;
                }
            }
        }
        for (term, weight) in &self.generic_terms {
            if text.contains(term.as_str()) {
                score -= weight;
            }
        }

        score.clamp(0.0, 1.0)
    }
}

fn terms(list: &[(&str, f64)]) -> Vec<(String, f64)> {
    list.iter().map(|(t, w)| (t.to_string(), *w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principle(name: &str) -> Principle {
        Principle::new(name)
    }

    #[test]
    fn benign_query_is_fully_compliant() {
        let evaluator = LexiconEvaluator::with_defaults();
        let score = evaluator.assess(
            &principle("harm-prevention"),
            "summarize the quarterly report",
            &Context::new(),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn risk_terms_reduce_score() {
        let evaluator = LexiconEvaluator::with_defaults();
        let score = evaluator.assess(
            &principle("privacy-protection"),
            "Look up the SSN and password for this user",
            &Context::new(),
        );
        assert!(score < 0.5);
    }

    #[test]
    fn context_string_values_are_scanned() {
        let evaluator = LexiconEvaluator::with_defaults();
        let mut context = Context::new();
        context.insert(
            "attachment".into(),
            serde_json::Value::String("full medical record export".into()),
        );
        let score = evaluator.assess(&principle("privacy-protection"), "process this", &context);
        assert!(score < 1.0);
    }

    #[test]
    fn generic_terms_apply_to_unknown_principles() {
        let evaluator = LexiconEvaluator::with_defaults();
        let score = evaluator.assess(
            &principle("some-custom-principle"),
            "bypass the audit checks",
            &Context::new(),
        );
        assert!(score < 1.0);
    }

    #[test]
    fn score_clamps_at_zero() {
        let evaluator = LexiconEvaluator::new()
            .with_term("p", "alpha", 0.8)
            .with_term("p", "beta", 0.9);
        let score = evaluator.assess(&principle("p"), "alpha beta", &Context::new());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let evaluator = LexiconEvaluator::with_defaults();
        let score = evaluator.assess(
            &principle("fraud-prevention"),
            "LAUNDER the proceeds",
            &Context::new(),
        );
        assert!(score < 1.0);
    }
}
