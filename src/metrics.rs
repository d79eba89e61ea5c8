//! Prometheus collectors for HTTP request metrics
//!
//! Four collectors, all partitioned by the same `{status, method, host, route}`
//! label set:
//! - `<ns>_<sub>_requests_total` (counter)
//! - `<ns>_<sub>_request_duration_milliseconds`
//! - `<ns>_<sub>_request_size_bytes`
//! - `<ns>_<sub>_response_size_bytes`
//!
//! The `prometheus` crate has no summary type, so the three distributions are
//! histograms; they expose the same `_count` and `_sum` series a summary would.

use axum::http::{Method, StatusCode};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    exponential_buckets,
};
use std::sync::Arc;

/// Label names shared by all four collectors, in label-value order
pub const LABELS: [&str; 4] = ["status", "method", "host", "route"];

const DURATION_BUCKETS_MS: [f64; 12] = [
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
];

/// Partition key of one request's observations
///
/// Built once per request and passed by reference to every collector, so the
/// four observations can never disagree on their labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    status: String,
    method: String,
    host: String,
    route: Arc<str>,
}

impl LabelSet {
    /// `host` is lower-cased; `route` must be a registered template, never a
    /// concrete request path.
    pub fn new(status: StatusCode, method: &Method, host: &str, route: Arc<str>) -> Self {
        Self {
            status: status.as_u16().to_string(),
            method: method.as_str().to_string(),
            host: host.to_lowercase(),
            route,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    fn values(&self) -> [&str; 4] {
        [&self.status, &self.method, &self.host, &self.route]
    }
}

/// Request metrics registered on an explicit registry
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests_total: CounterVec,
    request_duration: HistogramVec,
    request_size: HistogramVec,
    response_size: HistogramVec,
}

impl HttpMetrics {
    /// Create the four collectors and register them on `registry`
    ///
    /// # Errors
    ///
    /// Returns `prometheus::Error::AlreadyReg` when collectors with the same
    /// namespace and subsystem are already registered on `registry`. Nothing
    /// is left half-registered in that case.
    pub fn register(
        registry: &Registry,
        namespace: &str,
        subsystem: &str,
    ) -> Result<Self, prometheus::Error> {
        let requests_total = CounterVec::new(
            Opts::new(
                "requests_total",
                "How many HTTP requests processed, partitioned by status code, method, host and route.",
            )
            .namespace(namespace)
            .subsystem(subsystem),
            &LABELS,
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_milliseconds",
                "The HTTP request latencies in milliseconds.",
            )
            .namespace(namespace)
            .subsystem(subsystem)
            .buckets(DURATION_BUCKETS_MS.to_vec()),
            &LABELS,
        )?;

        // 64 B .. 1 MiB
        let size_buckets = exponential_buckets(64.0, 4.0, 8)?;

        let request_size = HistogramVec::new(
            HistogramOpts::new("request_size_bytes", "The HTTP request sizes in bytes.")
                .namespace(namespace)
                .subsystem(subsystem)
                .buckets(size_buckets.clone()),
            &LABELS,
        )?;

        let response_size = HistogramVec::new(
            HistogramOpts::new(
                "response_size_bytes",
                "The HTTP response sizes in bytes. Streaming bodies without a Content-Length count as 0.",
            )
                .namespace(namespace)
                .subsystem(subsystem)
                .buckets(size_buckets),
            &LABELS,
        )?;

        let metrics = Self {
            registry: registry.clone(),
            requests_total,
            request_duration,
            request_size,
            response_size,
        };
        metrics.register_all()?;

        tracing::debug!(namespace, subsystem, "Registered HTTP request metrics");
        Ok(metrics)
    }

    fn register_all(&self) -> Result<(), prometheus::Error> {
        self.registry
            .register(Box::new(self.requests_total.clone()))?;

        let rest: [Box<dyn prometheus::core::Collector>; 3] = [
            Box::new(self.request_duration.clone()),
            Box::new(self.request_size.clone()),
            Box::new(self.response_size.clone()),
        ];
        for (registered, collector) in rest.into_iter().enumerate() {
            if let Err(e) = self.registry.register(collector) {
                self.unregister_first(registered + 1);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Roll back a partial registration
    fn unregister_first(&self, count: usize) {
        let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
            Box::new(self.requests_total.clone()),
            Box::new(self.request_duration.clone()),
            Box::new(self.request_size.clone()),
            Box::new(self.response_size.clone()),
        ];
        for collector in collectors.into_iter().take(count) {
            if let Err(e) = self.registry.unregister(collector) {
                tracing::warn!(error = %e, "Failed to roll back metric registration");
            }
        }
    }

    /// Record one completed request
    ///
    /// Increments the request counter and observes duration, request size and
    /// response size, all under `labels`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the label values. Callers log
    /// it and move on; recording is never retried.
    pub fn record_request(
        &self,
        labels: &LabelSet,
        duration_ms: f64,
        request_size: u64,
        response_size: u64,
    ) -> Result<(), prometheus::Error> {
        let values = labels.values();

        self.request_duration
            .get_metric_with_label_values(&values)?
            .observe(duration_ms);
        self.requests_total
            .get_metric_with_label_values(&values)?
            .inc();
        self.request_size
            .get_metric_with_label_values(&values)?
            .observe(request_size as f64);
        self.response_size
            .get_metric_with_label_values(&values)?
            .observe(response_size as f64);
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gather all metrics and encode them in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            let metric_names: Vec<_> = metric_families.iter().map(|mf| mf.name()).collect();

            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                metric_names = ?metric_names,
                "Prometheus text encoder failed"
            );

            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            let valid_up_to = e.utf8_error().valid_up_to();
            tracing::error!(
                invalid_byte_index = valid_up_to,
                "Prometheus encoder produced invalid UTF-8"
            );
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                valid_up_to, e
            ))
        })
    }
}
