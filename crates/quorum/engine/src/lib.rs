//! # quorum-engine
//!
//! Production wrapper around the quorum ensemble: the `govern` entry point,
//! TTL verdict caching, token-bucket rate limiting, request timeouts,
//! domain adaptation, and per-call metrics.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use quorum_engine::{DomainProfile, GovernanceEngine};
//! use quorum_forest::LexiconEvaluator;
//! use quorum_types::{Context, EngineConfig, PrincipleRegistry};
//!
//! # async fn demo() -> Result<(), quorum_engine::GovernError> {
//! let engine = GovernanceEngine::for_domain(
//!     PrincipleRegistry::baseline(),
//!     DomainProfile::healthcare(),
//!     EngineConfig::from_env()?,
//!     Arc::new(LexiconEvaluator::with_defaults()),
//! )?;
//!
//! let verdict = engine.govern("archive the visit summary", &Context::new()).await?;
//! println!("{} at confidence {:.2}", verdict.consensus, verdict.confidence);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod domain;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod metrics;
mod recommend;

pub use cache::VerdictCache;
pub use domain::{
    DomainCallback, DomainProfile, SensitiveDataCallback, TransactionRiskCallback,
};
pub use engine::GovernanceEngine;
pub use error::{CallbackError, GovernError};
pub use limiter::RateLimiter;
pub use metrics::{CallMetrics, MemorySink, MetricsSink, NoopSink};
