//! Prometheus metrics for the management node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] that an exporter can encode
//! into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Mirroring ───────────────────────────────────────────────────────
    pub blocks_ingested: IntCounter,
    /// Blocks that were already mirrored and were skipped.
    pub duplicate_blocks: IntCounter,
    pub transactions_ingested: IntCounter,
    pub ingest_failures: IntCounter,
    pub refresh_failures: IntCounter,
    pub active_subscriptions: IntGauge,
    /// Time to decode and persist one block, in milliseconds.
    pub ingest_latency_ms: Histogram,

    // ── Governance ──────────────────────────────────────────────────────
    pub proposals_created: IntCounter,
    pub votes_recorded: IntCounter,
    pub dispatch_successes: IntCounter,
    /// Approved proposals the ledger already satisfied; nothing was submitted.
    pub dispatch_unchanged: IntCounter,
    pub dispatch_failures: IntCounter,
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let blocks_ingested = register_int_counter_with_registry!(
            Opts::new("chainops_blocks_ingested_total", "Blocks mirrored into the store"),
            registry
        )
        .expect("failed to register blocks_ingested counter");

        let duplicate_blocks = register_int_counter_with_registry!(
            Opts::new(
                "chainops_duplicate_blocks_total",
                "Blocks received again after being mirrored"
            ),
            registry
        )
        .expect("failed to register duplicate_blocks counter");

        let transactions_ingested = register_int_counter_with_registry!(
            Opts::new(
                "chainops_transactions_ingested_total",
                "Transactions mirrored into the store"
            ),
            registry
        )
        .expect("failed to register transactions_ingested counter");

        let ingest_failures = register_int_counter_with_registry!(
            Opts::new("chainops_ingest_failures_total", "Blocks that failed to ingest"),
            registry
        )
        .expect("failed to register ingest_failures counter");

        let refresh_failures = register_int_counter_with_registry!(
            Opts::new(
                "chainops_refresh_failures_total",
                "Failed chain metadata refreshes"
            ),
            registry
        )
        .expect("failed to register refresh_failures counter");

        let active_subscriptions = register_int_gauge_with_registry!(
            Opts::new(
                "chainops_active_subscriptions",
                "Chains currently subscribed"
            ),
            registry
        )
        .expect("failed to register active_subscriptions gauge");

        let ingest_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "chainops_ingest_latency_ms",
                "Block ingestion time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.5, 2.0, 15).unwrap()),
            registry
        )
        .expect("failed to register ingest_latency_ms histogram");

        let proposals_created = register_int_counter_with_registry!(
            Opts::new("chainops_proposals_created_total", "Governance proposals opened"),
            registry
        )
        .expect("failed to register proposals_created counter");

        let votes_recorded = register_int_counter_with_registry!(
            Opts::new("chainops_votes_recorded_total", "Governance votes recorded"),
            registry
        )
        .expect("failed to register votes_recorded counter");

        let dispatch_successes = register_int_counter_with_registry!(
            Opts::new(
                "chainops_dispatch_successes_total",
                "Approved proposals accepted by the ledger"
            ),
            registry
        )
        .expect("failed to register dispatch_successes counter");

        let dispatch_unchanged = register_int_counter_with_registry!(
            Opts::new(
                "chainops_dispatch_unchanged_total",
                "Approved proposals that needed no ledger transaction"
            ),
            registry
        )
        .expect("failed to register dispatch_unchanged counter");

        let dispatch_failures = register_int_counter_with_registry!(
            Opts::new(
                "chainops_dispatch_failures_total",
                "Approved proposals the ledger rejected or never answered"
            ),
            registry
        )
        .expect("failed to register dispatch_failures counter");

        Self {
            registry,
            blocks_ingested,
            duplicate_blocks,
            transactions_ingested,
            ingest_failures,
            refresh_failures,
            active_subscriptions,
            ingest_latency_ms,
            proposals_created,
            votes_recorded,
            dispatch_successes,
            dispatch_unchanged,
            dispatch_failures,
        }
    }
}

impl NodeMetrics {
    /// Every registered metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| NodeError::Config(format!("metrics encoding failed: {e}")))?;
        String::from_utf8(buffer)
            .map_err(|e| NodeError::Config(format!("metrics encoding failed: {e}")))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_export_lists_counters() {
        let metrics = NodeMetrics::new();
        metrics.blocks_ingested.inc_by(3);
        metrics.active_subscriptions.set(2);
        let text = metrics.encode_text().unwrap();
        assert!(text.contains("chainops_blocks_ingested_total 3"));
        assert!(text.contains("chainops_active_subscriptions 2"));
    }

    #[test]
    fn registries_are_independent() {
        let a = NodeMetrics::new();
        let b = NodeMetrics::default();
        a.votes_recorded.inc();
        assert_eq!(b.votes_recorded.get(), 0);
    }
}
