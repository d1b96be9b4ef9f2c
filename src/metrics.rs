use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

static FINDINGS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waf_findings_total", "Findings emitted, by slug"),
        &["slug"],
    )
    .expect("metric creation failed")
});

static INSTANT_TERMINATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("waf_instant_terminations", "Requests terminated with a 403")
        .expect("metric creation failed")
});

static BAN_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("waf_ban_failures", "Failed ban-signal calls")
        .expect("metric creation failed")
});

/// Registers the counters with the default registry, for hosts that expose
/// a Prometheus scrape endpoint. The counters themselves work unregistered.
pub struct MetricsCollector {
    pub registry: Arc<Registry>,
}

impl MetricsCollector {
    pub fn new() -> Result<Self, prometheus::Error> {
        prometheus::register(Box::new(FINDINGS_TOTAL.clone()))?;
        prometheus::register(Box::new(INSTANT_TERMINATIONS.clone()))?;
        prometheus::register(Box::new(BAN_FAILURES.clone()))?;

        Ok(Self {
            registry: Arc::new(prometheus::default_registry().clone()),
        })
    }
}

pub(crate) fn record_finding(slug: &str) {
    FINDINGS_TOTAL.with_label_values(&[slug]).inc();
}

pub(crate) fn record_termination() {
    INSTANT_TERMINATIONS.inc();
}

pub(crate) fn record_ban_failure() {
    BAN_FAILURES.inc();
}
