//! Thin wrappers around the `metrics` crate facade (spec §9 ambient stack:
//! "metric counters ... are the only process-wide state"). Call sites name
//! the event, not the metric backend.

use metrics::{counter, gauge, histogram};

pub fn record_quote_request(outcome: &'static str) {
    counter!("sqs_quote_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_pricing_fallback() {
    counter!("sqs_pricing_fallback_total").increment(1);
}

pub fn record_ingest_commit(height: u64) {
    gauge!("sqs_last_committed_height").set(height as f64);
}

pub fn record_pricing_job_duration(seconds: f64) {
    histogram!("sqs_pricing_job_duration_seconds").record(seconds);
}

pub fn record_route_evaluation_failure() {
    counter!("sqs_route_evaluation_failures_total").increment(1);
}
