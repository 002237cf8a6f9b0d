//! # Prometheus Metrics
//!
//! Operational metrics for the EduChain server, scraped at the `/metrics`
//! endpoint on the configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] so they do not
//! collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the server.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct ApiMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of credentials anchored to the ledger.
    pub credentials_issued_total: IntCounter,
    /// Total number of verification requests served.
    pub credential_verifications_total: IntCounter,
    /// Total number of course enrollments created.
    pub enrollments_total: IntCounter,
    /// Total number of loan applications processed.
    pub loan_applications_total: IntCounter,
    /// Total number of loan applications that cleared the approval gate.
    pub loans_approved_total: IntCounter,
    /// Current number of accounts on the simulated ledger.
    pub ledger_accounts: IntGauge,
    /// Current number of transactions recorded on the simulated ledger.
    pub ledger_transactions: IntGauge,
    /// Histogram of end-to-end issuance latency in seconds.
    pub issuance_latency_seconds: Histogram,
}

impl ApiMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("educhain".into()), None)
            .expect("failed to create prometheus registry");

        let credentials_issued_total = IntCounter::new(
            "credentials_issued_total",
            "Total number of credentials anchored to the ledger",
        )
        .expect("metric creation");
        registry
            .register(Box::new(credentials_issued_total.clone()))
            .expect("metric registration");

        let credential_verifications_total = IntCounter::new(
            "credential_verifications_total",
            "Total number of credential verification requests served",
        )
        .expect("metric creation");
        registry
            .register(Box::new(credential_verifications_total.clone()))
            .expect("metric registration");

        let enrollments_total = IntCounter::new(
            "enrollments_total",
            "Total number of course enrollments created",
        )
        .expect("metric creation");
        registry
            .register(Box::new(enrollments_total.clone()))
            .expect("metric registration");

        let loan_applications_total = IntCounter::new(
            "loan_applications_total",
            "Total number of loan applications processed",
        )
        .expect("metric creation");
        registry
            .register(Box::new(loan_applications_total.clone()))
            .expect("metric registration");

        let loans_approved_total = IntCounter::new(
            "loans_approved_total",
            "Total number of loan applications that were approved",
        )
        .expect("metric creation");
        registry
            .register(Box::new(loans_approved_total.clone()))
            .expect("metric registration");

        let ledger_accounts = IntGauge::new(
            "ledger_accounts",
            "Current number of accounts on the simulated ledger",
        )
        .expect("metric creation");
        registry
            .register(Box::new(ledger_accounts.clone()))
            .expect("metric registration");

        let ledger_transactions = IntGauge::new(
            "ledger_transactions",
            "Current number of transactions on the simulated ledger",
        )
        .expect("metric creation");
        registry
            .register(Box::new(ledger_transactions.clone()))
            .expect("metric registration");

        let issuance_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "issuance_latency_seconds",
                "End-to-end credential issuance latency in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(issuance_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            credentials_issued_total,
            credential_verifications_total,
            enrollments_total,
            loan_applications_total,
            loans_approved_total,
            ledger_accounts,
            ledger_transactions,
            issuance_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<ApiMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_encode() {
        let metrics = ApiMetrics::new();
        metrics.credentials_issued_total.inc();
        metrics.loan_applications_total.inc();
        metrics.ledger_accounts.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("educhain_credentials_issued_total 1"));
        assert!(text.contains("educhain_ledger_accounts 2"));
    }
}
