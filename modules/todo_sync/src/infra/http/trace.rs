//! W3C trace-context propagation for outgoing requests.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub const TRACEPARENT: &str = "traceparent";

/// Insert a fresh `traceparent` header (version 00, sampled).
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let trace_id = rand::random::<u128>().max(1);
    let span_id = rand::random::<u64>().max(1);
    let traceparent = format!("00-{:032x}-{:016x}-01", trace_id, span_id);

    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(HeaderName::from_static(TRACEPARENT), value);
    }
}

/// Trace id part of a `traceparent` value.
pub fn parse_trace_id(traceparent: &str) -> Option<&str> {
    let mut parts = traceparent.split('-');
    match (parts.next(), parts.next()) {
        (Some("00"), Some(trace_id)) if trace_id.len() == 32 => Some(trace_id),
        _ => None,
    }
}
