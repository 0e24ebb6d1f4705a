//! Domain adaptation by composition.
//!
//! A `DomainProfile` is a configuration-time descriptor: extra principles
//! appended to the base registry, threshold overrides, and named diagnostic
//! callbacks. The engine applies it at construction by rebuilding the
//! forest over the augmented registry; nothing is patched incrementally.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use quorum_types::{Context, Principle};

use crate::error::CallbackError;

// ── Callback Interface ──────────────────────────────────────────────────

/// A domain-specific post-hoc check, registered by name.
///
/// Callbacks may block or perform I/O; the engine runs each one isolated
/// and individually time-bounded. A failing callback becomes an error entry
/// in the verdict's diagnostics and never aborts the decision.
#[async_trait]
pub trait DomainCallback: Send + Sync {
    /// Key under which this callback's diagnostic is recorded.
    fn name(&self) -> &str;

    async fn run(&self, query: &str, context: &Context)
        -> Result<serde_json::Value, CallbackError>;
}

// ── Domain Profile ──────────────────────────────────────────────────────

/// Deployment-domain descriptor applied at engine construction.
#[derive(Clone)]
pub struct DomainProfile {
    pub name: String,
    pub principles: Vec<Principle>,
    pub confidence_threshold: f64,
    pub violation_threshold: f64,
    callbacks: Vec<Arc<dyn DomainCallback>>,
}

impl DomainProfile {
    pub fn new(
        name: impl Into<String>,
        confidence_threshold: f64,
        violation_threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            principles: Vec::new(),
            confidence_threshold,
            violation_threshold,
            callbacks: Vec::new(),
        }
    }

    pub fn with_principle(mut self, principle: Principle) -> Self {
        self.principles.push(principle);
        self
    }

    pub fn with_callback(mut self, callback: Arc<dyn DomainCallback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn callbacks(&self) -> &[Arc<dyn DomainCallback>] {
        &self.callbacks
    }

    /// Healthcare deployments: strict confidence, near-zero violation
    /// tolerance, sensitive-data screening.
    pub fn healthcare() -> Self {
        Self::new("healthcare", 0.8, 0.05)
            .with_principle(Principle::new("patient-privacy"))
            .with_principle(Principle::new("clinical-accuracy"))
            .with_callback(Arc::new(SensitiveDataCallback::default()))
    }

    /// Financial deployments: elevated thresholds plus transaction-risk
    /// screening.
    pub fn finance() -> Self {
        Self::new("finance", 0.75, 0.08)
            .with_principle(Principle::new("transaction-integrity"))
            .with_principle(Principle::new("fraud-prevention"))
            .with_callback(Arc::new(TransactionRiskCallback))
    }
}

impl std::fmt::Debug for DomainProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainProfile")
            .field("name", &self.name)
            .field("principles", &self.principles)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("violation_threshold", &self.violation_threshold)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

// ── Built-in Callbacks ──────────────────────────────────────────────────

/// Screens the query and context for sensitive-data markers.
pub struct SensitiveDataCallback {
    markers: Vec<String>,
}

impl Default for SensitiveDataCallback {
    fn default() -> Self {
        Self {
            markers: ["patient", "diagnosis", "medical record", "ssn", "date of birth"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[async_trait]
impl DomainCallback for SensitiveDataCallback {
    fn name(&self) -> &str {
        "sensitive_data"
    }

    async fn run(
        &self,
        query: &str,
        context: &Context,
    ) -> Result<serde_json::Value, CallbackError> {
        let mut text = query.to_lowercase();
        for value in context.values() {
            if let Some(s) = value.as_str() {
                text.push(' ');
                text.push_str(&s.to_lowercase());
            }
        }

        let found: Vec<&str> = self
            .markers
            .iter()
            .filter(|m| text.contains(m.as_str()))
            .map(|m| m.as_str())
            .collect();

        Ok(json!({
            "sensitive_data_detected": !found.is_empty(),
            "markers": found,
        }))
    }
}

/// Flags high-value transactions from the context's `amount` field.
pub struct TransactionRiskCallback;

/// Amounts at or above this are treated as high value.
const HIGH_VALUE_THRESHOLD: f64 = 10_000.0;

#[async_trait]
impl DomainCallback for TransactionRiskCallback {
    fn name(&self) -> &str {
        "transaction_risk"
    }

    async fn run(
        &self,
        _query: &str,
        context: &Context,
    ) -> Result<serde_json::Value, CallbackError> {
        let amount = context.get("amount").and_then(|v| v.as_f64());
        let high_value = amount.is_some_and(|a| a >= HIGH_VALUE_THRESHOLD);

        Ok(json!({
            "high_value": high_value,
            "amount": amount,
        }))
    }
}
