//! End-to-end scenarios for the governance engine.

use std::sync::Arc;

use async_trait::async_trait;

use quorum_engine::{
    CallbackError, DomainCallback, DomainProfile, GovernError, GovernanceEngine,
};
use quorum_forest::LexiconEvaluator;
use quorum_types::{
    ConsensusLabel, Context, EngineConfig, Principle, PrincipleRegistry, RateLimitPolicy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn default_engine(config: EngineConfig) -> GovernanceEngine {
    init_tracing();
    GovernanceEngine::new(
        PrincipleRegistry::baseline(),
        config,
        Arc::new(LexiconEvaluator::with_defaults()),
    )
    .unwrap()
}

fn small_registry() -> PrincipleRegistry {
    PrincipleRegistry::new(
        [
            "harm-prevention",
            "privacy-protection",
            "truthfulness",
            "fairness",
            "transparency",
        ]
        .into_iter()
        .map(Principle::new)
        .collect(),
    )
    .unwrap()
}

#[test]
fn tampered_constitutional_hash_is_fatal() {
    let config = EngineConfig {
        constitutional_hash: "deadbeef".into(),
        ..Default::default()
    };
    let result = GovernanceEngine::new(
        PrincipleRegistry::baseline(),
        config,
        Arc::new(LexiconEvaluator::with_defaults()),
    );

    match result {
        Err(GovernError::InvalidConfiguration(message)) => {
            assert!(message.contains("constitutional hash"));
        }
        other => panic!("expected InvalidConfiguration, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn identical_calls_within_ttl_are_bit_identical() {
    let engine = default_engine(EngineConfig::default());
    let mut context = Context::new();
    context.insert("channel".into(), serde_json::json!("support"));

    let first = engine.govern("close the account", &context).await.unwrap();
    let second = engine.govern("close the account", &context).await.unwrap();

    // Same id, same timestamp, same everything: the cached value unchanged
    assert_eq!(first, second);
}

#[tokio::test]
async fn expired_entries_are_recomputed() {
    let config = EngineConfig {
        cache_ttl_secs: 0,
        ..Default::default()
    };
    let engine = default_engine(config);

    let first = engine.govern("close the account", &Context::new()).await.unwrap();
    let second = engine.govern("close the account", &Context::new()).await.unwrap();

    // Fresh verdicts get fresh ids
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn small_forest_on_benign_query_only_warns_about_confidence() {
    // B = 3 over 5 principles: raw confidence 1.0 calibrates to ~0.44,
    // below the 0.6 review threshold.
    let config = EngineConfig {
        unit_count: 3,
        ..Default::default()
    };
    let engine = GovernanceEngine::new(
        small_registry(),
        config,
        Arc::new(LexiconEvaluator::with_defaults()),
    )
    .unwrap();

    let verdict = engine
        .govern("translate the newsletter", &Context::new())
        .await
        .unwrap();

    assert_eq!(verdict.consensus, ConsensusLabel::Comply);
    assert!(verdict.flagged_units.is_empty());
    assert!(verdict.confidence < 0.6);
    assert!(!verdict.recommendations.is_empty());
    assert!(verdict
        .recommendations
        .iter()
        .all(|r| r.contains("confidence")));
}

#[tokio::test]
async fn concurrent_burst_hits_the_rate_limit() {
    let config = EngineConfig {
        rate_limit_rps: 1.0,
        rate_limit_policy: RateLimitPolicy::Reject,
        ..Default::default()
    };
    let engine = Arc::new(default_engine(config));

    let mut handles = Vec::new();
    for i in 0..5 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.govern(&format!("request {i}"), &Context::new()).await
        }));
    }

    let mut rejected = 0;
    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(GovernError::RateLimitExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(admitted >= 1);
    assert!(rejected >= 1);
}

#[tokio::test]
async fn healthcare_domain_screens_sensitive_data() {
    let base = PrincipleRegistry::baseline();
    let base_len = base.len();
    let engine = GovernanceEngine::for_domain(
        base,
        DomainProfile::healthcare(),
        EngineConfig::default(),
        Arc::new(LexiconEvaluator::with_defaults()),
    )
    .unwrap();

    // Domain augmentation grows the registry
    assert!(engine.registry().len() > base_len);
    assert_eq!(engine.config().confidence_threshold, 0.8);
    assert_eq!(engine.config().violation_threshold, 0.05);

    let verdict = engine
        .govern("attach the patient diagnosis to the claim", &Context::new())
        .await
        .unwrap();

    let screening = &verdict.domain_diagnostics["sensitive_data"];
    assert_eq!(screening["sensitive_data_detected"], serde_json::json!(true));
}

#[tokio::test]
async fn verdicts_carry_the_constitutional_hash() {
    let engine = default_engine(EngineConfig::default());
    let verdict = engine.govern("hello", &Context::new()).await.unwrap();
    assert_eq!(
        verdict.constitutional_hash,
        quorum_types::CONSTITUTIONAL_HASH
    );
}

struct StalledCallback;

#[async_trait]
impl DomainCallback for StalledCallback {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn run(
        &self,
        _query: &str,
        _context: &Context,
    ) -> Result<serde_json::Value, CallbackError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(serde_json::json!({}))
    }
}

#[tokio::test(start_paused = true)]
async fn overall_timeout_abandons_inflight_work() {
    let profile = DomainProfile::new("slow", 0.6, 0.1).with_callback(Arc::new(StalledCallback));
    let config = EngineConfig {
        request_timeout_secs: 1,
        ..Default::default()
    };
    let engine = GovernanceEngine::for_domain(
        PrincipleRegistry::baseline(),
        profile,
        config,
        Arc::new(LexiconEvaluator::with_defaults()),
    )
    .unwrap();

    let result = engine.govern("hello", &Context::new()).await;
    assert!(matches!(
        result,
        Err(GovernError::Timeout { timeout_secs: 1 })
    ));
}

#[tokio::test]
async fn importance_scores_are_present_without_flags() {
    let engine = default_engine(EngineConfig::default());
    let verdict = engine
        .govern("publish the changelog", &Context::new())
        .await
        .unwrap();

    assert!(verdict.flagged_units.is_empty());
    // Importance is still computed over the whole forest
    assert!(!verdict.principle_importance.is_empty());
    // ...but nothing is recommended for incorporation
    assert!(verdict
        .recommendations
        .iter()
        .all(|r| !r.contains("Incorporate")));
}
