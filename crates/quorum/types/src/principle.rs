//! Governance principles and the principle registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named governance rule dimension.
///
/// Identity is the name; two principles with the same name are the same
/// principle. Immutable after registry construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principle {
    pub name: String,
}

impl Principle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name tokens, split on `-` and `_`. Used by similarity heuristics.
    pub fn tokens(&self) -> Vec<&str> {
        self.name
            .split(['-', '_'])
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Errors from registry construction.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("principle registry must not be empty")]
    EmptyRegistry,

    #[error("duplicate principle: {0}")]
    DuplicatePrinciple(String),
}

/// Ordered set of governance principles with unique names.
///
/// Built once at engine startup (or per domain instantiation) and read-only
/// thereafter. Ordering is the insertion order and is stable for the life of
/// the registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrincipleRegistry {
    principles: Vec<Principle>,
}

impl PrincipleRegistry {
    /// Create a registry from an ordered list of principles.
    ///
    /// Fails on an empty list or a duplicate name.
    pub fn new(principles: Vec<Principle>) -> Result<Self, RegistryError> {
        if principles.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }
        let mut seen = std::collections::HashSet::new();
        for p in &principles {
            if !seen.insert(p.name.as_str()) {
                return Err(RegistryError::DuplicatePrinciple(p.name.clone()));
            }
        }
        Ok(Self { principles })
    }

    /// The baseline constitutional principle set.
    pub fn baseline() -> Self {
        let names = [
            "harm-prevention",
            "privacy-protection",
            "truthfulness",
            "fairness",
            "transparency",
            "accountability",
            "user-autonomy",
            "data-minimization",
        ];
        Self {
            principles: names.into_iter().map(Principle::new).collect(),
        }
    }

    /// A new registry with `extra` principles appended after the existing
    /// ones. The original registry is untouched; domain augmentation rebuilds
    /// rather than patches.
    pub fn augmented(&self, extra: &[Principle]) -> Result<Self, RegistryError> {
        let mut principles = self.principles.clone();
        principles.extend(extra.iter().cloned());
        Self::new(principles)
    }

    pub fn len(&self) -> usize {
        self.principles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Principle> {
        self.principles.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Principle> {
        self.principles.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.principles.iter().any(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.principles.iter().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_rejected() {
        assert!(matches!(
            PrincipleRegistry::new(vec![]),
            Err(RegistryError::EmptyRegistry)
        ));
    }

    #[test]
    fn duplicate_name_rejected() {
        let result = PrincipleRegistry::new(vec![
            Principle::new("privacy-protection"),
            Principle::new("privacy-protection"),
        ]);
        assert!(matches!(result, Err(RegistryError::DuplicatePrinciple(_))));
    }

    #[test]
    fn baseline_is_valid_and_ordered() {
        let registry = PrincipleRegistry::baseline();
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.get(0).unwrap().name, "harm-prevention");
        // Re-validating the baseline must succeed
        PrincipleRegistry::new(registry.iter().cloned().collect()).unwrap();
    }

    #[test]
    fn augmented_appends_without_mutating_base() {
        let base = PrincipleRegistry::baseline();
        let extended = base
            .augmented(&[Principle::new("patient-privacy")])
            .unwrap();
        assert_eq!(base.len(), 8);
        assert_eq!(extended.len(), 9);
        assert!(extended.contains("patient-privacy"));
        assert!(!base.contains("patient-privacy"));
    }

    #[test]
    fn augmented_rejects_collision_with_base() {
        let base = PrincipleRegistry::baseline();
        let result = base.augmented(&[Principle::new("fairness")]);
        assert!(matches!(result, Err(RegistryError::DuplicatePrinciple(_))));
    }

    #[test]
    fn tokens_split_on_separators() {
        let p = Principle::new("privacy_data-protection");
        assert_eq!(p.tokens(), vec!["privacy", "data", "protection"]);
    }
}
