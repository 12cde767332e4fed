use prometheus_client::{metrics::counter::Counter, registry::Registry};

/// Counters tracking what the simulator did with packets.
pub(crate) struct Metrics {
    /// Packets handed to `send` (before loss is applied).
    pub sent: Counter,
    /// Packets silently dropped by simulated loss.
    pub lost: Counter,
    /// Extra entries queued by simulated duplication.
    pub duplicated: Counter,
    /// Buffered packets displaced when the ring wrapped.
    pub overwritten: Counter,
    /// Packets drained by a receive call.
    pub delivered: Counter,
}

impl Metrics {
    pub fn init(registry: &mut Registry) -> Self {
        let sent = Counter::default();
        let lost = Counter::default();
        let duplicated = Counter::default();
        let overwritten = Counter::default();
        let delivered = Counter::default();
        registry.register("packets_sent", "packets handed to send", sent.clone());
        registry.register("packets_lost", "packets dropped by simulated loss", lost.clone());
        registry.register(
            "packets_duplicated",
            "extra entries queued by simulated duplication",
            duplicated.clone(),
        );
        registry.register(
            "packets_overwritten",
            "buffered packets displaced on ring wrap",
            overwritten.clone(),
        );
        registry.register(
            "packets_delivered",
            "packets drained by a receive call",
            delivered.clone(),
        );
        Self {
            sent,
            lost,
            duplicated,
            overwritten,
            delivered,
        }
    }
}
