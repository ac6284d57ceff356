use reqwest::header::{HeaderName, CACHE_CONTROL, CONTENT_TYPE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::UpstreamError;

/// A fully drained upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    /// Raw `Set-Cookie` header values, in the order the upstream sent them.
    pub set_cookies: Vec<String>,
    pub body: Vec<u8>,
}

/// An upstream body decoded for relaying back to the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl UpstreamResponse {
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, UpstreamError> {
        let status = response.status();
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        };
        let content_type = header(CONTENT_TYPE);
        let cache_control = header(CACHE_CONTROL);
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            content_type,
            cache_control,
            set_cookies,
            body,
        })
    }

    /// Decodes the body as JSON when it parses, raw text otherwise.
    #[must_use]
    pub fn payload(&self) -> Payload {
        match serde_json::from_slice(&self.body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(String::from_utf8_lossy(&self.body).into_owned()),
        }
    }

    /// The body as JSON, or `None` when it is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Why no upstream response could be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyFailure {
    pub status: StatusCode,
    pub message: String,
}

impl ProxyFailure {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".to_string(),
        }
    }

    pub(crate) fn unreachable(error: &UpstreamError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: error.to_string(),
        }
    }
}

/// Result of forwarding one browser request: at most one upstream response.
#[derive(Debug, Clone)]
pub enum ProxyOutcome {
    Response(UpstreamResponse),
    Failed(ProxyFailure),
}

impl ProxyOutcome {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyOutcome::Response(response) => response.status,
            ProxyOutcome::Failed(failure) => failure.status,
        }
    }

    /// The upstream JSON body of a 2xx response, if there is one.
    #[must_use]
    pub fn success_json(&self) -> Option<Value> {
        match self {
            ProxyOutcome::Response(response) if response.status.is_success() => response.json(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::OK,
            content_type: None,
            cache_control: None,
            set_cookies: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn payload_prefers_json() {
        let payload = response(r#"{"ok":true}"#).payload();
        assert_eq!(payload, Payload::Json(serde_json::json!({ "ok": true })));
    }

    #[test]
    fn payload_falls_back_to_text() {
        let payload = response("<html>oops</html>").payload();
        assert_eq!(payload, Payload::Text("<html>oops</html>".to_string()));
    }

    #[test]
    fn success_json_ignores_error_statuses() {
        let mut failed = response(r#"{"message":"nope"}"#);
        failed.status = StatusCode::UNAUTHORIZED;
        assert!(ProxyOutcome::Response(failed).success_json().is_none());
        assert!(ProxyOutcome::Failed(ProxyFailure::not_found())
            .success_json()
            .is_none());
    }
}
