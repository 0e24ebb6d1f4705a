//! Per-call metrics emission.
//!
//! The engine reports one record per `govern` call to a pluggable sink; it
//! never owns the exporter's transport. Exporters (Prometheus bridges,
//! log shippers) live outside this crate.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use quorum_types::ConsensusLabel;

/// One `govern` call, as seen by observability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallMetrics {
    pub latency_ms: u64,
    /// Absent when the call failed before a verdict was produced.
    pub consensus: Option<ConsensusLabel>,
    pub confidence: Option<f64>,
    pub compliance_score: Option<f64>,
    pub cache_hit: bool,
    pub rate_limited: bool,
    pub timed_out: bool,
}

impl CallMetrics {
    pub(crate) fn failure(latency_ms: u64, rate_limited: bool, timed_out: bool) -> Self {
        Self {
            latency_ms,
            consensus: None,
            confidence: None,
            compliance_score: None,
            cache_hit: false,
            rate_limited,
            timed_out,
        }
    }
}

/// Sink for per-call metrics records.
pub trait MetricsSink: Send + Sync {
    fn record(&self, metrics: CallMetrics);
}

/// Discards every record.
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _metrics: CallMetrics) {}
}

/// In-memory sink for tests and local inspection.
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<CallMetrics>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CallMetrics> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricsSink for MemorySink {
    fn record(&self, metrics: CallMetrics) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(metrics);
    }
}
