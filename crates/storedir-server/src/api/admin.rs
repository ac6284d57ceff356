//! Admin routes: store management and the visitor summary dashboard.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Extension, Json,
};
use storedir_upstream::{visitors::normalize_visitor_summary, Candidate, Forward, ProxyOutcome};

use crate::middleware::{Relay, RequestId};

use super::{outbound_body, path_segment, proxy_response, AppState};

/// Upstream spellings of the visitor summary endpoint, most current first.
const VISITOR_SUMMARY_PATHS: [&str; 8] = [
    "/admin/visitors/summary",
    "/admin/visitor/summary",
    "/admin/visitors-summary",
    "/admin/visitor-summary",
    "/admin/visitors/stats",
    "/admin/visitors",
    "/visitors/summary",
    "/visitor/summary",
];

pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    RawQuery(query): RawQuery,
) -> Response {
    let forward = Forward::new(&auth).with_query(query.as_deref());
    let outcome = state
        .upstream
        .relay(&Method::GET, "/admin/stores", &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn create_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outbound = outbound_body(&headers, &body);
    let forward = Forward::new(&auth).with_body(outbound.as_ref());
    let outcome = state
        .upstream
        .relay(&Method::POST, "/admin/stores", &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}

/// `GET`/`PUT`/`PATCH`/`DELETE /api/admin/stores/{id}`, forwarded with the
/// same method.
pub(super) async fn store_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    method: Method,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let id = match path_segment(&req_id.0, "store id", &id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let outbound = outbound_body(&headers, &body);
    let forward = Forward::new(&auth).with_body(outbound.as_ref());
    let outcome = state
        .upstream
        .relay(&method, &format!("/admin/stores/{id}"), &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn visitor_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    RawQuery(query): RawQuery,
) -> Response {
    let candidates: Vec<Candidate> = VISITOR_SUMMARY_PATHS
        .iter()
        .map(|path| Candidate::get(*path))
        .collect();
    let forward = Forward::new(&auth).with_query(query.as_deref());
    let outcome = state.upstream.probe(&candidates, &forward).await;

    if let ProxyOutcome::Response(upstream) = &outcome {
        if let Some(summary) = outcome.success_json() {
            return (upstream.status, Json(normalize_visitor_summary(summary))).into_response();
        }
    }
    proxy_response(&req_id.0, outcome)
}
