//! Prometheus metrics for insight-service.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, which keeps
//! tests free of global setup.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Provider metrics
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Pipeline metrics
pub static PAYLOAD_TRUNCATIONS_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static GENERATED_OUTPUT_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("insight_requests_total", "Total number of relay requests"),
        &["endpoint", "status"],
    )?;

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "insight_request_duration_seconds",
            "Relay request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["endpoint"],
    )?;

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "insight_provider_latency_seconds",
            "AI provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )?;

    let provider_errors = IntCounterVec::new(
        Opts::new("insight_provider_errors_total", "Total AI provider errors"),
        &["provider", "error_type"],
    )?;

    let tokens = IntCounterVec::new(
        Opts::new("insight_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )?;

    let truncations = IntCounter::new(
        "insight_payload_truncations_total",
        "Payloads cut down before being embedded in a prompt",
    )?;

    let generated_output = IntCounterVec::new(
        Opts::new(
            "insight_generated_output_total",
            "Generated samples by whether they parsed as JSON",
        ),
        &["kind"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(provider_latency.clone()))?;
    registry.register(Box::new(provider_errors.clone()))?;
    registry.register(Box::new(tokens.clone()))?;
    registry.register(Box::new(truncations.clone()))?;
    registry.register(Box::new(generated_output.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = REQUESTS_TOTAL.set(requests_total);
    let _ = REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = TOKENS_TOTAL.set(tokens);
    let _ = PAYLOAD_TRUNCATIONS_TOTAL.set(truncations);
    let _ = GENERATED_OUTPUT_TOTAL.set(generated_output);

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => return "# Metrics registry not initialized\n".to_string(),
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}

/// Record a completed relay request.
pub fn record_request(endpoint: &str, status: u16, duration_secs: f64) {
    if let Some(counter) = REQUESTS_TOTAL.get() {
        let status = status.to_string();
        counter.with_label_values(&[endpoint, status.as_str()]).inc();
    }
    if let Some(histogram) = REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[endpoint])
            .observe(duration_secs);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record token usage reported by the provider.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

pub fn record_truncation() {
    if let Some(counter) = PAYLOAD_TRUNCATIONS_TOTAL.get() {
        counter.inc();
    }
}

pub fn record_generated_output(kind: &str) {
    if let Some(counter) = GENERATED_OUTPUT_TOTAL.get() {
        counter.with_label_values(&[kind]).inc();
    }
}
