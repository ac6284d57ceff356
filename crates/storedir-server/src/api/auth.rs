//! Authentication routes.
//!
//! - `POST /api/auth/login`, `POST /api/auth/register`: relay upstream
//!   `Set-Cookie` verbatim and set the auth cookie from the returned token
//! - `POST /api/auth/logout`: always `{ "ok": true }` plus a clearing cookie
//! - `POST /api/auth/change-password`: probed across naming variants
//! - `GET`/`PUT /api/auth/me`: profile, probed across naming variants

use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde_json::{json, Value};
use storedir_core::AppConfig;
use storedir_upstream::{AuthRelay, Candidate, Forward, ProxyOutcome};

use crate::middleware::{Relay, RequestId};

use super::{mirror_response, outbound_body, proxy_response, ApiError, AppState};

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    exchange_credentials(&state, &req_id, &auth, jar, &headers, &body, "/auth/login").await
}

pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    exchange_credentials(&state, &req_id, &auth, jar, &headers, &body, "/auth/register").await
}

async fn exchange_credentials(
    state: &AppState,
    req_id: &RequestId,
    auth: &AuthRelay,
    jar: CookieJar,
    headers: &HeaderMap,
    body: &[u8],
    path: &str,
) -> Response {
    let outbound = outbound_body(headers, body);
    let forward = Forward::new(auth).with_body(outbound.as_ref());

    let upstream = match state.upstream.relay(&Method::POST, path, &forward).await {
        ProxyOutcome::Response(upstream) => upstream,
        failed @ ProxyOutcome::Failed(_) => return proxy_response(&req_id.0, failed),
    };

    let mut response = mirror_response(&upstream);
    for raw in &upstream.set_cookies {
        match HeaderValue::from_str(raw) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "dropping unrelayable upstream Set-Cookie"),
        }
    }

    let token = upstream
        .json()
        .filter(|_| upstream.status.is_success())
        .and_then(|value| token_from_body(&value));

    match token {
        Some(token) => (jar.add(auth_cookie(&state.config, token)), response).into_response(),
        None => response,
    }
}

/// Finds the session token in a login/register response body.
fn token_from_body(body: &Value) -> Option<String> {
    const KEYS: [&str; 3] = ["token", "accessToken", "access_token"];
    let nested = body.get("data");
    KEYS.iter()
        .find_map(|key| body.get(*key))
        .or_else(|| nested.and_then(|data| KEYS.iter().find_map(|key| data.get(*key))))
        .and_then(Value::as_str)
        .filter(|token| !token.trim().is_empty())
        .map(ToOwned::to_owned)
}

fn auth_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.auth_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::days(config.auth_cookie_max_age_days))
        .build()
}

fn clearing_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.auth_cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

/// Logs out upstream on a best-effort basis; the browser cookie is cleared
/// regardless of what the upstream says.
pub(super) async fn logout(
    State(state): State<AppState>,
    Relay(auth): Relay,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let outcome = state
        .upstream
        .relay(&Method::POST, "/auth/logout", &Forward::new(&auth))
        .await;
    if !outcome.status().is_success() {
        tracing::warn!(status = %outcome.status(), "upstream logout did not succeed");
    }

    (
        jar.add(clearing_cookie(&state.config)),
        Json(json!({ "ok": true })),
    )
}

fn change_password_candidates() -> [Candidate; 4] {
    [
        Candidate::new(Method::POST, "/auth/change-password"),
        Candidate::new(Method::PUT, "/auth/change-password"),
        Candidate::new(Method::PATCH, "/auth/change-password"),
        Candidate::new(Method::PUT, "/users/me/password"),
    ]
}

pub(super) async fn change_password(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !auth.has_credentials() {
        return ApiError::new(req_id.0, "unauthorized", "not signed in").into_response();
    }
    let outbound = outbound_body(&headers, &body);
    let forward = Forward::new(&auth).with_body(outbound.as_ref());
    let outcome = state
        .upstream
        .probe(&change_password_candidates(), &forward)
        .await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
) -> Response {
    if !auth.has_credentials() {
        return ApiError::new(req_id.0, "unauthorized", "not signed in").into_response();
    }
    let candidates = [
        Candidate::get("/auth/profile"),
        Candidate::get("/users/me"),
        Candidate::get("/users/profile"),
    ];
    let outcome = state
        .upstream
        .probe(&candidates, &Forward::new(&auth))
        .await;
    proxy_response(&req_id.0, outcome)
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Relay(auth): Relay,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !auth.has_credentials() {
        return ApiError::new(req_id.0, "unauthorized", "not signed in").into_response();
    }
    let candidates = [
        Candidate::new(Method::PUT, "/users/me"),
        Candidate::new(Method::PATCH, "/users/me"),
        Candidate::new(Method::PUT, "/users/profile"),
        Candidate::new(Method::PUT, "/auth/profile"),
    ];
    let outbound = outbound_body(&headers, &body);
    let forward = Forward::new(&auth).with_body(outbound.as_ref());
    let outcome = state.upstream.probe(&candidates, &forward).await;
    proxy_response(&req_id.0, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_found_at_top_level_or_under_data() {
        assert_eq!(
            token_from_body(&json!({ "token": "t1" })),
            Some("t1".to_string())
        );
        assert_eq!(
            token_from_body(&json!({ "data": { "accessToken": "t2" } })),
            Some("t2".to_string())
        );
        assert_eq!(token_from_body(&json!({ "token": "" })), None);
        assert_eq!(token_from_body(&json!({ "user": { "id": 1 } })), None);
    }
}
