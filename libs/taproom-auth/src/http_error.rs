use taproom_http::HttpError;

/// One-line description of `e` starting with `prefix`, safe to log.
///
/// Response bodies never appear: a status error reports only its code.
#[must_use]
pub fn format_http_error(e: &HttpError, prefix: &str) -> String {
    let detail = match e {
        HttpError::HttpStatus { status, .. } => format!("HTTP {status}"),
        HttpError::Timeout(after) => format!("request timed out after {after:?}"),
        HttpError::Transport(source) => format!("transport error: {source}"),
        HttpError::Overloaded => "request rejected: service overloaded".to_owned(),
        HttpError::ServiceClosed => "service unavailable".to_owned(),
        // These render from local state or parser positions only
        HttpError::Json(_)
        | HttpError::Tls(_)
        | HttpError::BodyTooLarge { .. }
        | HttpError::RequestBuild(_)
        | HttpError::InvalidHeaderName(_)
        | HttpError::InvalidHeaderValue(_)
        | HttpError::FormEncode(_)
        | HttpError::InvalidUri { .. }
        | HttpError::InvalidScheme { .. } => e.to_string(),
        _ => "request failed".to_owned(),
    };
    format!("{prefix} {detail}")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_errors_drop_the_body() {
        let err = HttpError::HttpStatus {
            status: http::StatusCode::UNAUTHORIZED,
            body_preview: r#"{"error":"invalid_client","client_secret":"oops"}"#.into(),
            content_type: None,
        };
        let msg = format_http_error(&err, "OAuth2 token");
        assert_eq!(msg, "OAuth2 token HTTP 401 Unauthorized");
        assert!(!msg.contains("oops"));
    }

    #[test]
    fn timeout_reports_duration() {
        let err = HttpError::Timeout(Duration::from_secs(30));
        assert_eq!(
            format_http_error(&err, "beer catalog"),
            "beer catalog request timed out after 30s"
        );
    }

    #[test]
    fn local_failures_keep_their_display() {
        let err = HttpError::BodyTooLarge {
            limit: 10,
            actual: 20,
        };
        let msg = format_http_error(&err, "CTX");
        assert!(msg.starts_with("CTX "), "{msg}");
        assert!(msg.ends_with(&err.to_string()), "{msg}");
        for err in [HttpError::Overloaded, HttpError::ServiceClosed] {
            assert!(format_http_error(&err, "CTX").starts_with("CTX "));
        }
    }
}
