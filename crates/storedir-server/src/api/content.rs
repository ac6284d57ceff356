//! Site content and visit tracking routes.

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use storedir_upstream::{AuthRelay, Forward};

use crate::middleware::{Relay, RequestId};

use super::{outbound_body, path_segment, proxy_response, query_pair, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SeoPageQuery {
    path: Option<String>,
}

async fn relay_get(
    state: &AppState,
    req_id: &RequestId,
    auth: &AuthRelay,
    path: &str,
    query: Option<&str>,
) -> Response {
    let forward = Forward::new(auth).with_query(query);
    let outcome = state.upstream.relay(&Method::GET, path, &forward).await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn list_videos(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    RawQuery(query): RawQuery,
) -> Response {
    relay_get(&state, &req_id, &auth, "/videos", query.as_deref()).await
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    RawQuery(query): RawQuery,
) -> Response {
    relay_get(&state, &req_id, &auth, "/categories", query.as_deref()).await
}

/// Tracking scripts are injected into every page head, so an unavailable
/// upstream degrades to an empty list instead of an error.
pub(super) async fn tracking_scripts(State(state): State<AppState>) -> Response {
    let anonymous = AuthRelay::anonymous();
    let outcome = state
        .upstream
        .relay(&Method::GET, "/tracking-scripts", &Forward::new(&anonymous))
        .await;

    match outcome.success_json() {
        Some(scripts) => Json(scripts).into_response(),
        None => {
            tracing::warn!(status = %outcome.status(), "tracking scripts unavailable");
            (StatusCode::OK, Json(json!([]))).into_response()
        }
    }
}

/// SEO content for one page together with the site-wide tracking scripts.
///
/// Both upstream calls run concurrently; a page-level failure is relayed,
/// a tracking-script failure becomes an empty list.
pub(super) async fn seo_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SeoPageQuery>,
) -> Response {
    let Some(page_path) = params.path.filter(|p| !p.trim().is_empty()) else {
        return ApiError::new(req_id.0, "bad_request", "path query parameter is required")
            .into_response();
    };

    let anonymous = AuthRelay::anonymous();
    let page_query = query_pair("path", page_path.trim());
    let page_forward = Forward::new(&anonymous).with_query(Some(&page_query));
    let scripts_forward = Forward::new(&anonymous);

    let (page, scripts) = tokio::join!(
        state
            .upstream
            .relay(&Method::GET, "/public/seo/page", &page_forward),
        state
            .upstream
            .relay(&Method::GET, "/tracking-scripts", &scripts_forward),
    );

    let Some(page_json) = page.success_json() else {
        return proxy_response(&req_id.0, page);
    };

    Json(json!({
        "page": page_json,
        "tracking_scripts": scripts.success_json().unwrap_or_else(|| json!([])),
    }))
    .into_response()
}

pub(super) async fn visit_website(
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
        .relay(&Method::POST, "/visitor/visit/website", &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn visit_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
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
        .relay(&Method::POST, &format!("/visitor/visit/store/{id}"), &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}
