//! `GET /api/media/{*path}`: binary relay for upstream-hosted images.
//!
//! The body is passed through untouched; only the upstream's content type
//! and cache directive are mirrored.

use axum::{
    extract::{Path, RawQuery, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    Extension,
};
use storedir_upstream::{Forward, ProxyOutcome};

use crate::middleware::{Relay, RequestId};

use super::{path_segment, proxy_response, ApiError, AppState};

/// Encodes each segment of a wildcard path, refusing traversal segments.
fn media_path(request_id: &str, raw: &str) -> Result<String, ApiError> {
    let mut encoded = Vec::new();
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(ApiError::new(
                request_id,
                "bad_request",
                "media path may not contain relative segments",
            ));
        }
        encoded.push(path_segment(request_id, "media path", segment)?);
    }
    if encoded.is_empty() {
        return Err(ApiError::new(request_id, "bad_request", "media path is required"));
    }
    Ok(format!("/{}", encoded.join("/")))
}

pub(super) async fn proxy_media(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let upstream_path = match media_path(&req_id.0, &path) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    let forward = Forward::new(&auth).with_query(query.as_deref());
    let upstream = match state
        .upstream
        .relay(&Method::GET, &upstream_path, &forward)
        .await
    {
        ProxyOutcome::Response(upstream) => upstream,
        failed @ ProxyOutcome::Failed(_) => return proxy_response(&req_id.0, failed),
    };

    let mut response = (upstream.status, upstream.body).into_response();
    let headers = response.headers_mut();
    let content_type = upstream
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(CONTENT_TYPE, content_type);
    if let Some(cache) = upstream
        .cache_control
        .as_deref()
        .and_then(|cc| HeaderValue::from_str(cc).ok())
    {
        headers.insert(CACHE_CONTROL, cache);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_path_encodes_segments() {
        let path = media_path("req", "uploads/stores/my logo.png").expect("valid");
        assert_eq!(path, "/uploads/stores/my%20logo.png");
    }

    #[test]
    fn media_path_rejects_traversal() {
        assert!(media_path("req", "uploads/../secrets").is_err());
        assert!(media_path("req", "//").is_err());
    }
}
