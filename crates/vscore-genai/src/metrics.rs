//! Generative model request metrics.

use metrics::{counter, histogram};

pub mod names {
    /// Total generate calls by model and outcome.
    pub const REQUESTS_TOTAL: &str = "vscore_genai_requests_total";

    /// Generate latency in seconds by model.
    pub const LATENCY_SECONDS: &str = "vscore_genai_latency_seconds";

    /// Times a fallback model was tried after a failure.
    pub const FALLBACKS_TOTAL: &str = "vscore_genai_fallbacks_total";
}

pub fn record_request(model: &str, success: bool, latency_ms: f64) {
    let outcome = if success { "success" } else { "error" };
    counter!(
        names::REQUESTS_TOTAL,
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(names::LATENCY_SECONDS, "model" => model.to_string()).record(latency_ms / 1000.0);
}

pub fn record_fallback(from_model: &str) {
    counter!(names::FALLBACKS_TOTAL, "from" => from_model.to_string()).increment(1);
}
