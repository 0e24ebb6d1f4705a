//! # quorum-types
//!
//! Shared types for the quorum governance engine.
//!
//! - [`Principle`] / [`PrincipleRegistry`]: the ordered, unique-named set of
//!   governance principles every other component reasons over.
//! - [`GovernanceVerdict`]: the fully-materialized, immutable result of a
//!   single `govern` call.
//! - [`EngineConfig`]: validated engine configuration, overridable from the
//!   process environment at startup.

#![deny(unsafe_code)]

pub mod config;
pub mod principle;
pub mod verdict;

pub use config::{ConfigError, EngineConfig, RateLimitPolicy, CONSTITUTIONAL_HASH};
pub use principle::{Principle, PrincipleRegistry, RegistryError};
pub use verdict::{ConsensusLabel, Context, GovernanceVerdict};
