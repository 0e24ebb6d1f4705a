//! The governance engine: forest evaluation behind the production wrapper.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use quorum_forest::{
    compliance_score, estimate_oob, helpful_principles, importance_scores, tally,
    CorrelationMatrix, Forest, PrincipleEvaluator, TokenOverlapSimilarity, UnitDecision,
};
use quorum_types::{
    ConsensusLabel, Context, EngineConfig, GovernanceVerdict, PrincipleRegistry,
};

use crate::cache::{cache_key, VerdictCache};
use crate::domain::{DomainCallback, DomainProfile};
use crate::error::GovernError;
use crate::limiter::RateLimiter;
use crate::metrics::{CallMetrics, MetricsSink, NoopSink};
use crate::recommend::build_recommendations;

/// Bound on any single domain callback.
const CALLBACK_TIMEOUT_MS: u64 = 2_000;

/// Ensemble compliance decision engine.
///
/// Built once per deployment (or per domain); the registry and forest are
/// read-only afterwards. The cache and rate limiter are the only shared
/// mutable state across concurrent `govern` calls.
pub struct GovernanceEngine {
    config: EngineConfig,
    registry: Arc<PrincipleRegistry>,
    forest: Arc<Forest>,
    evaluator: Arc<dyn PrincipleEvaluator>,
    callbacks: Vec<Arc<dyn DomainCallback>>,
    cache: VerdictCache,
    limiter: RateLimiter,
    metrics: Arc<dyn MetricsSink>,
    domain: Option<String>,
}

impl GovernanceEngine {
    /// Build an engine over the base registry.
    pub fn new(
        registry: PrincipleRegistry,
        config: EngineConfig,
        evaluator: Arc<dyn PrincipleEvaluator>,
    ) -> Result<Self, GovernError> {
        Self::build(registry, config, evaluator, Vec::new(), None)
    }

    /// Build an engine adapted to a deployment domain.
    ///
    /// The profile's principles are appended to `base` (growing n, m, and
    /// the forest), its thresholds override the configured ones, and its
    /// callbacks are registered by name.
    pub fn for_domain(
        base: PrincipleRegistry,
        profile: DomainProfile,
        mut config: EngineConfig,
        evaluator: Arc<dyn PrincipleEvaluator>,
    ) -> Result<Self, GovernError> {
        config.confidence_threshold = profile.confidence_threshold;
        config.violation_threshold = profile.violation_threshold;

        let registry = base.augmented(&profile.principles)?;
        Self::build(
            registry,
            config,
            evaluator,
            profile.callbacks().to_vec(),
            Some(profile.name),
        )
    }

    fn build(
        registry: PrincipleRegistry,
        config: EngineConfig,
        evaluator: Arc<dyn PrincipleEvaluator>,
        callbacks: Vec<Arc<dyn DomainCallback>>,
        domain: Option<String>,
    ) -> Result<Self, GovernError> {
        config.validate()?;

        let matrix = CorrelationMatrix::build(&registry, &TokenOverlapSimilarity)?;
        let forest = Forest::grow(
            &registry,
            &matrix,
            config.unit_count,
            config.sampling_seed,
        )?;

        info!(
            domain = domain.as_deref().unwrap_or("base"),
            principles = registry.len(),
            units = forest.unit_count(),
            subset_size = forest.subset_size(),
            "Governance engine initialized"
        );

        Ok(Self {
            cache: VerdictCache::new(config.cache_ttl_secs),
            limiter: RateLimiter::new(config.rate_limit_rps, config.rate_limit_policy),
            config,
            registry: Arc::new(registry),
            forest: Arc::new(forest),
            evaluator,
            callbacks,
            metrics: Arc::new(NoopSink),
            domain,
        })
    }

    /// Replace the metrics sink.
    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &PrincipleRegistry {
        &self.registry
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Evict expired cache entries.
    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep()
    }

    /// Evaluate a query against the governance principles.
    ///
    /// Checks the cache and rate limit, runs the forest in parallel, and
    /// returns a fully-materialized verdict stamped with the constitutional
    /// hash. The whole call is bounded by the configured request timeout;
    /// on expiry in-flight work is abandoned and no partial result is
    /// returned.
    pub async fn govern(
        &self,
        query: &str,
        context: &Context,
    ) -> Result<GovernanceVerdict, GovernError> {
        let start = Instant::now();
        let key = cache_key(query, context);

        if let Some(verdict) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            self.metrics.record(CallMetrics {
                latency_ms: start.elapsed().as_millis() as u64,
                consensus: Some(verdict.consensus),
                confidence: Some(verdict.confidence),
                compliance_score: Some(verdict.compliance_score),
                cache_hit: true,
                rate_limited: false,
                timed_out: false,
            });
            return Ok(verdict);
        }

        if let Err(err) = self.limiter.acquire().await {
            self.metrics.record(CallMetrics::failure(
                start.elapsed().as_millis() as u64,
                true,
                false,
            ));
            return Err(err);
        }

        let budget = Duration::from_secs(self.config.request_timeout_secs);
        let verdict = match tokio::time::timeout(budget, self.decide(query, context)).await {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!(
                    timeout_secs = self.config.request_timeout_secs,
                    "Governance call timed out"
                );
                self.metrics.record(CallMetrics::failure(
                    start.elapsed().as_millis() as u64,
                    false,
                    true,
                ));
                return Err(GovernError::Timeout {
                    timeout_secs: self.config.request_timeout_secs,
                });
            }
        };

        if self.config.cache_ttl_secs > 0 {
            self.cache.insert(key, verdict.clone());
        }

        info!(
            verdict_id = %verdict.id,
            consensus = %verdict.consensus,
            confidence = verdict.confidence,
            compliance_score = verdict.compliance_score,
            flagged = verdict.flagged_units.len(),
            "Governance verdict issued"
        );
        self.metrics.record(CallMetrics {
            latency_ms: start.elapsed().as_millis() as u64,
            consensus: Some(verdict.consensus),
            confidence: Some(verdict.confidence),
            compliance_score: Some(verdict.compliance_score),
            cache_hit: false,
            rate_limited: false,
            timed_out: false,
        });

        Ok(verdict)
    }

    /// The uncached decision pipeline: forest, consensus, diagnostics,
    /// importance, recommendations, domain callbacks.
    async fn decide(&self, query: &str, context: &Context) -> GovernanceVerdict {
        let decisions = self.evaluate_units(query, context).await;
        let labels: Vec<ConsensusLabel> = decisions.iter().map(|d| d.label).collect();
        let outcome = tally(&labels);

        let oob = estimate_oob(
            &self.forest,
            &self.registry,
            self.evaluator.as_ref(),
            query,
            context,
            self.config.violation_threshold,
        );
        let score = compliance_score(oob.mean_violation_rate, outcome.confidence);

        // Importance is always computed; attribution targets the flagged
        // units when there are any, the whole forest otherwise.
        let targets: Vec<usize> = if oob.flagged_units.is_empty() {
            (0..self.forest.unit_count()).collect()
        } else {
            oob.flagged_units.clone()
        };
        let importance = importance_scores(
            &self.forest,
            &self.registry,
            self.evaluator.as_ref(),
            query,
            context,
            &targets,
        );
        let helpful = if oob.flagged_units.is_empty() {
            Vec::new()
        } else {
            helpful_principles(&importance)
        };

        let recommendations = build_recommendations(
            &outcome,
            self.config.confidence_threshold,
            &oob.flagged_units,
            &helpful,
        );
        let domain_diagnostics = self.run_callbacks(query, context).await;

        GovernanceVerdict {
            id: Uuid::new_v4().to_string(),
            consensus: outcome.label,
            confidence: outcome.confidence,
            compliance_score: score,
            per_unit_decisions: labels,
            principle_importance: importance,
            flagged_units: oob.flagged_units,
            recommendations,
            domain_diagnostics,
            constitutional_hash: self.config.constitutional_hash.clone(),
            decided_at: Utc::now(),
        }
    }

    /// Evaluate every unit concurrently and join before aggregation.
    async fn evaluate_units(&self, query: &str, context: &Context) -> Vec<UnitDecision> {
        let query: Arc<str> = Arc::from(query);
        let context = Arc::new(context.clone());

        let mut join_set = tokio::task::JoinSet::new();
        for unit_id in 0..self.forest.unit_count() {
            let forest = Arc::clone(&self.forest);
            let evaluator = Arc::clone(&self.evaluator);
            let query = Arc::clone(&query);
            let context = Arc::clone(&context);
            join_set.spawn(async move {
                let decision =
                    forest.units()[unit_id].evaluate(&query, &context, evaluator.as_ref());
                (unit_id, decision)
            });
        }

        let mut decisions = Vec::with_capacity(self.forest.unit_count());
        while let Some(joined) = join_set.join_next().await {
            if let Ok(pair) = joined {
                decisions.push(pair);
            }
        }
        // Vote order must not depend on completion order
        decisions.sort_by_key(|(id, _)| *id);
        decisions.into_iter().map(|(_, decision)| decision).collect()
    }

    /// Run every domain callback concurrently, each isolated in its own
    /// task and individually time-bounded. Failures become error entries.
    async fn run_callbacks(
        &self,
        query: &str,
        context: &Context,
    ) -> BTreeMap<String, serde_json::Value> {
        let mut handles = Vec::with_capacity(self.callbacks.len());
        for callback in &self.callbacks {
            let name = callback.name().to_string();
            let callback = Arc::clone(callback);
            let query = query.to_string();
            let context = context.clone();

            let handle = tokio::spawn(async move {
                tokio::time::timeout(
                    Duration::from_millis(CALLBACK_TIMEOUT_MS),
                    callback.run(&query, &context),
                )
                .await
            });
            handles.push((name, handle));
        }

        let mut diagnostics = BTreeMap::new();
        for (name, handle) in handles {
            let value = match handle.await {
                Ok(Ok(Ok(value))) => value,
                Ok(Ok(Err(err))) => {
                    warn!(callback = %name, error = %err, "Domain callback failed");
                    json!({ "error": err.to_string() })
                }
                Ok(Err(_)) => {
                    warn!(callback = %name, "Domain callback timed out");
                    json!({ "error": format!("callback timed out after {CALLBACK_TIMEOUT_MS} ms") })
                }
                Err(_) => {
                    warn!(callback = %name, "Domain callback panicked");
                    json!({ "error": "callback panicked" })
                }
            };
            diagnostics.insert(name, value);
        }
        diagnostics
    }
}
