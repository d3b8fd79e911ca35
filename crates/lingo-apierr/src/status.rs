use reqwest::StatusCode;

/// Statuses for which repeating the same request later may succeed.
pub const RETRYABLE_STATUSES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool { RETRYABLE_STATUSES.contains(&status) }

pub fn is_rate_limited_status(status: u16) -> bool { status == 429 }

/// Standard reason phrase for `status`, or `""` when the code has none.
pub fn status_text(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
