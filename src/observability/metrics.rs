use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub webhook_events_total: IntCounterVec,
    pub orders_awaiting_broadcast: IntGauge,
    pub broadcast_latency_seconds: HistogramVec,
    pub transitions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let webhook_events_total = IntCounterVec::new(
            Opts::new("webhook_events_total", "Inbound webhook events by kind and outcome"),
            &["event", "outcome"],
        )
        .expect("valid webhook_events_total metric");

        let orders_awaiting_broadcast = IntGauge::new(
            "orders_awaiting_broadcast",
            "Orders queued for candidate fan-out",
        )
        .expect("valid orders_awaiting_broadcast metric");

        let broadcast_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "broadcast_latency_seconds",
                "Latency of broadcast fan-out in seconds",
            ),
            &["outcome"],
        )
        .expect("valid broadcast_latency_seconds metric");

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Order status transitions by target and outcome"),
            &["to_status", "outcome"],
        )
        .expect("valid transitions_total metric");

        registry
            .register(Box::new(webhook_events_total.clone()))
            .expect("register webhook_events_total");
        registry
            .register(Box::new(orders_awaiting_broadcast.clone()))
            .expect("register orders_awaiting_broadcast");
        registry
            .register(Box::new(broadcast_latency_seconds.clone()))
            .expect("register broadcast_latency_seconds");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");

        Self {
            registry,
            webhook_events_total,
            orders_awaiting_broadcast,
            broadcast_latency_seconds,
            transitions_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
