use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::status::status_text;

const NON_JSON_REASON: &str = "non-json error body";
const INVALID_JSON_REASON: &str = "invalid json in error body";
const UNHANDLED_REASON: &str = "unhandled error format";
const NO_DETAILS_REASON: &str = "server error without details";

/// Decode a non-success response body into an [`ApiError`].
///
/// The service has answered with several body shapes over time. They are
/// tried in a fixed order and the first match wins:
///
/// 1. `{ "message": str, "statusCode": num, "error": str }`
/// 2. `{ "error": { "message"?, "code"?, "details"? } }`
/// 3. `{ "message": str, "code"|"errorCode": num, "details"? }`
/// 4. anything else decodable as JSON
///
/// Bodies that are empty or not JSON still produce an error carrying the
/// status phrase. The function never fails.
pub fn parse(body: &[u8], status: u16) -> ApiError {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    let phrase = status_text(status);

    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return ApiError {
            status,
            message: phrase.to_owned(),
            reason: NON_JSON_REASON.to_owned(),
            raw: trimmed.to_owned(),
            ..ApiError::default()
        };
    }

    let decoded: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            let mut details = Map::new();
            details.insert("unmarshal_error".to_owned(), Value::String(e.to_string()));
            return ApiError {
                status,
                message: phrase.to_owned(),
                reason: INVALID_JSON_REASON.to_owned(),
                raw: trimmed.to_owned(),
                details,
                ..ApiError::default()
            };
        }
    };

    let base = ApiError {
        status,
        raw: trimmed.to_owned(),
        ..ApiError::default()
    };

    let Value::Object(obj) = decoded else {
        return ApiError {
            message: phrase.to_owned(),
            reason: UNHANDLED_REASON.to_owned(),
            ..base
        };
    };

    if let Some(err) = top_level_shape(&obj) {
        return ApiError { details: obj, ..err.merge(base) };
    }

    if let Some(Value::Object(nested)) = obj.get("error") {
        let message = get_str(nested, "message").unwrap_or(phrase);
        return ApiError {
            code: nested.get("code").and_then(coerce_int).unwrap_or(i64::from(status)),
            message: non_empty_or(message, phrase),
            details: pick_details(nested),
            ..base
        };
    }

    if let Some(message) = get_str(&obj, "message") {
        let code = obj
            .get("code")
            .and_then(coerce_int)
            .or_else(|| obj.get("errorCode").and_then(coerce_int));
        if let Some(code) = code {
            return ApiError {
                code,
                message: message.to_owned(),
                details: pick_details(&obj),
                ..base
            };
        }
    }

    let message = get_str(&obj, "message").unwrap_or("");
    ApiError {
        message: non_empty_or(message, phrase),
        reason: get_str(&obj, "error").unwrap_or(UNHANDLED_REASON).to_owned(),
        details: obj,
        ..base
    }
}

/// Fields of shape 1, matched only when all three are present and well typed.
struct TopLevel {
    code: i64,
    message: String,
    reason: String,
}

impl TopLevel {
    fn merge(self, base: ApiError) -> ApiError {
        ApiError {
            code: self.code,
            message: self.message,
            reason: self.reason,
            ..base
        }
    }
}

fn top_level_shape(obj: &Map<String, Value>) -> Option<TopLevel> {
    let message = get_str(obj, "message")?;
    let code = obj.get("statusCode").and_then(coerce_int)?;
    let reason = get_str(obj, "error")?;
    Some(TopLevel {
        code,
        message: message.to_owned(),
        reason: reason.to_owned(),
    })
}

/// `details` passes through when it is an object, is boxed under `"details"`
/// when it is any other value, and defaults to a fixed reason when absent.
fn pick_details(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    match obj.get("details") {
        Some(Value::Object(details)) => return details.clone(),
        Some(other) => {
            out.insert("details".to_owned(), other.clone());
        }
        None => {
            out.insert("reason".to_owned(), Value::String(NO_DETAILS_REASON.to_owned()));
        }
    }
    out
}

/// Lenient integer coercion.
///
/// Accepts integer numbers, finite floats (truncated toward zero) and strings
/// holding a base-10 integer such as `"429"`. Everything else is `None`.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_u64()
                .and_then(|u| i64::try_from(u).ok())
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        }),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

fn get_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn non_empty_or(s: &str, fallback: &str) -> String {
    let chosen = if s.is_empty() { fallback } else { s };
    chosen.to_owned()
}
