use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rejected_total: AtomicU64,
    productive_total: AtomicU64,
    unproductive_total: AtomicU64,
    gateway_failures_total: AtomicU64,
    configuration_failures_total: AtomicU64,
    malformed_responses_total: AtomicU64,
    reply_failures_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected_total: u64,
    pub productive_total: u64,
    pub unproductive_total: u64,
    pub gateway_failures_total: u64,
    pub configuration_failures_total: u64,
    pub malformed_responses_total: u64,
    pub reply_failures_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_classified(&self, productive: bool) {
        let counter = if productive {
            &self.productive_total
        } else {
            &self.unproductive_total
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_gateway_failure(&self) {
        self.gateway_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_configuration_failure(&self) {
        self.configuration_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_malformed_response(&self) {
        self.malformed_responses_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reply_failure(&self) {
        self.reply_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            productive_total: self.productive_total.load(Ordering::Relaxed),
            unproductive_total: self.unproductive_total.load(Ordering::Relaxed),
            gateway_failures_total: self.gateway_failures_total.load(Ordering::Relaxed),
            configuration_failures_total: self
                .configuration_failures_total
                .load(Ordering::Relaxed),
            malformed_responses_total: self.malformed_responses_total.load(Ordering::Relaxed),
            reply_failures_total: self.reply_failures_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,triage_api=info,triage_agents=info,triage_inference=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
