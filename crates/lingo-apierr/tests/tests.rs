use lingo_apierr::{ApiError, parse};

#[test]
fn parsed_errors_render_service_message() {
    let body = br#"{"error":{"message":"Invalid `lang_iso` parameter","code":400}}"#;
    let err = parse(body, 400);
    assert_eq!(err.to_string(), "Invalid `lang_iso` parameter");
    assert!(!err.is_retryable());
}

#[test]
fn parsed_errors_keep_status_for_classification() {
    for status in [408u16, 425, 429, 500, 502, 503, 504] {
        let err = parse(b"upstream hiccup", status);
        assert!(err.is_retryable(), "{status}");
        assert_eq!(err.raw, "upstream hiccup");
    }
    assert!(parse(b"", 429).is_rate_limited());
    assert!(!parse(b"", 422).is_retryable());
}

#[test]
fn boxed_error_downcasts() {
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(ApiError::new(404, "gone"));
    let api = boxed.downcast_ref::<ApiError>().expect("downcast");
    assert_eq!(api.status, 404);
}
