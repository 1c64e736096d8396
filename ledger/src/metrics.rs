//! Prometheus metrics for the authentication ledger.
//!
//! [`LedgerMetrics`] owns a dedicated [`Registry`] whose contents can be
//! rendered in the Prometheus text exposition format by whatever serves
//! them.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct LedgerMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Operations opened.
    pub registrations: IntCounter,
    /// Votes accepted, labelled `vote` = approve | reject.
    pub votes: IntCounterVec,
    /// Operations decided, labelled `outcome` = authenticated | rejected.
    pub decisions: IntCounterVec,
    /// Decided operations reopened by their main wallet.
    pub resets: IntCounter,
    /// Calls refused, labelled by error kind.
    pub failed_calls: IntCounterVec,
    /// Event deliveries whose listener panicked.
    pub listener_panics: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Operations currently awaiting a decision.
    pub pending_operations: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Seconds from registration to decision.
    pub decision_latency_secs: Histogram,
}

impl LedgerMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let registrations = register_int_counter_with_registry!(
            Opts::new(
                "authwallet_registrations_total",
                "Total operations registered"
            ),
            registry
        )
        .expect("failed to register registrations counter");

        let votes = register_int_counter_vec_with_registry!(
            Opts::new("authwallet_votes_total", "Total votes accepted"),
            &["vote"],
            registry
        )
        .expect("failed to register votes counter");

        let decisions = register_int_counter_vec_with_registry!(
            Opts::new(
                "authwallet_decisions_total",
                "Total operations that reached a terminal state"
            ),
            &["outcome"],
            registry
        )
        .expect("failed to register decisions counter");

        let resets = register_int_counter_with_registry!(
            Opts::new("authwallet_resets_total", "Total operations reset"),
            registry
        )
        .expect("failed to register resets counter");

        let failed_calls = register_int_counter_vec_with_registry!(
            Opts::new("authwallet_failed_calls_total", "Total calls refused"),
            &["error"],
            registry
        )
        .expect("failed to register failed_calls counter");

        let listener_panics = register_int_counter_with_registry!(
            Opts::new(
                "authwallet_listener_panics_total",
                "Event deliveries whose listener panicked"
            ),
            registry
        )
        .expect("failed to register listener_panics counter");

        let pending_operations = register_int_gauge_with_registry!(
            Opts::new(
                "authwallet_pending_operations",
                "Operations awaiting a decision"
            ),
            registry
        )
        .expect("failed to register pending_operations gauge");

        // 1 s → ~9 h
        let decision_latency_secs = register_histogram_with_registry!(
            HistogramOpts::new(
                "authwallet_decision_latency_seconds",
                "Time from registration to decision"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 16).expect("valid buckets")),
            registry
        )
        .expect("failed to register decision_latency histogram");

        Self {
            registry,
            registrations,
            votes,
            decisions,
            resets,
            failed_calls,
            listener_panics,
            pending_operations,
            decision_latency_secs,
        }
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for LedgerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = LedgerMetrics::new();
        metrics.registrations.inc();
        metrics.votes.with_label_values(&["approve"]).inc();
        metrics.failed_calls.with_label_values(&["already_voted"]).inc();
        metrics.pending_operations.set(1);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("authwallet_registrations_total 1"));
        assert!(text.contains("authwallet_votes_total{vote=\"approve\"} 1"));
        assert!(text.contains("authwallet_failed_calls_total{error=\"already_voted\"} 1"));
        assert!(text.contains("authwallet_pending_operations 1"));
    }

    #[test]
    fn registries_are_independent() {
        let a = LedgerMetrics::new();
        let b = LedgerMetrics::new();
        a.resets.inc();
        assert_eq!(a.resets.get(), 1);
        assert_eq!(b.resets.get(), 0);
    }
}
