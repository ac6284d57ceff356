//! Public store directory routes.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};
use storedir_upstream::{AuthRelay, Candidate, Forward, ProxyOutcome};

use crate::middleware::{Relay, RequestId};

use super::{outbound_body, path_segment, proxy_response, query_pair, AppState};

fn store_candidates(id: &str) -> [Candidate; 2] {
    [
        Candidate::get(format!("/stores/{id}")),
        Candidate::get(format!("/public/stores/{id}")),
    ]
}

pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    RawQuery(query): RawQuery,
) -> Response {
    let candidates = [Candidate::get("/stores"), Candidate::get("/public/stores")];
    let forward = Forward::new(&auth).with_query(query.as_deref());
    let outcome = state.upstream.probe(&candidates, &forward).await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn get_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    Path(id): Path<String>,
) -> Response {
    let id = match path_segment(&req_id.0, "store id", &id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let outcome = state
        .upstream
        .probe(&store_candidates(&id), &Forward::new(&auth))
        .await;
    proxy_response(&req_id.0, outcome)
}

/// Store detail plus the SEO content of its page, fetched concurrently.
///
/// A missing store is relayed as-is; missing SEO content becomes `null`.
pub(super) async fn store_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    Path(id): Path<String>,
) -> Response {
    let segment = match path_segment(&req_id.0, "store id", &id) {
        Ok(segment) => segment,
        Err(e) => return e.into_response(),
    };

    // The SEO lookup takes the site path, so it is encoded once as a query value.
    let candidates = store_candidates(&segment);
    let seo_query = query_pair("path", &format!("/stores/{}", id.trim()));
    let anonymous = AuthRelay::anonymous();
    let store_forward = Forward::new(&auth);
    let seo_forward = Forward::new(&anonymous).with_query(Some(&seo_query));

    let (store, seo) = tokio::join!(
        state.upstream.probe(&candidates, &store_forward),
        state
            .upstream
            .relay(&Method::GET, "/public/seo/page", &seo_forward),
    );

    let Some(store_json) = store.success_json() else {
        return proxy_response(&req_id.0, store);
    };
    if !seo.status().is_success() {
        tracing::debug!(
            store_id = %id.trim(),
            status = %seo.status(),
            "no SEO content for store page"
        );
    }

    Json(json!({
        "store": store_json,
        "seo": seo.success_json().unwrap_or(Value::Null),
    }))
    .into_response()
}

/// `GET`/`POST /api/stores/{id}/reviews`, forwarded with the same method.
#[allow(clippy::too_many_arguments)]
pub(super) async fn reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    method: Method,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let id = match path_segment(&req_id.0, "store id", &id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let outbound = outbound_body(&headers, &body);
    let forward = Forward::new(&auth)
        .with_query(query.as_deref())
        .with_body(outbound.as_ref());
    let outcome = state
        .upstream
        .relay(&method, &format!("/stores/{id}/reviews"), &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}
