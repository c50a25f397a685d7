use rand::Rng;

/// Generate a trace id for an error occurrence: a random 64-bit value in
/// lowercase hex
pub fn generate_trace_id() -> String {
    format!("{:x}", rand::thread_rng().gen::<u64>())
}

/// Generate a unique request id
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a header value to string
pub fn parse_header_to_string(value: &hyper::header::HeaderValue) -> Option<String> {
    value.to_str().ok().map(|s| s.to_string())
}

/// Split a comma separated list, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
