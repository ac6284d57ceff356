mod admin;
mod auth;
mod content;
mod media;
mod stores;


use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{self, CACHE_CONTROL, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use storedir_core::AppConfig;
use storedir_upstream::{
    OutboundBody, Payload, ProxyFailure, ProxyOutcome, UpstreamClient, UpstreamResponse,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

/// Characters left unescaped when an identifier becomes an upstream path
/// segment or query value.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    upstream: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// Wraps a prober/relay failure, keeping its status.
    pub fn from_failure(request_id: impl Into<String>, failure: &ProxyFailure) -> Self {
        let code = match failure.status {
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::BAD_GATEWAY => "bad_gateway",
            _ => "internal_error",
        };
        Self::new(request_id, code, failure.message.clone())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Converts the result of a relay or probe into the browser response.
pub(super) fn proxy_response(request_id: &str, outcome: ProxyOutcome) -> Response {
    match outcome {
        ProxyOutcome::Response(upstream) => mirror_response(&upstream),
        ProxyOutcome::Failed(failure) => {
            ApiError::from_failure(request_id, &failure).into_response()
        }
    }
}

/// Mirrors an upstream response: same status and content type, JSON
/// re-encoded when the body parses, raw text otherwise.
pub(super) fn mirror_response(upstream: &UpstreamResponse) -> Response {
    let mut response = match upstream.payload() {
        Payload::Json(value) => (upstream.status, Json(value)).into_response(),
        Payload::Text(text) => (upstream.status, text).into_response(),
    };
    if let Some(content_type) = upstream
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

/// Percent-encodes a route parameter for use as one upstream path segment.
pub(super) fn path_segment(request_id: &str, name: &str, raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::new(
            request_id,
            "bad_request",
            format!("{name} is required"),
        ));
    }
    Ok(utf8_percent_encode(trimmed, SEGMENT).to_string())
}

/// Encodes a single `key=value` query string.
pub(super) fn query_pair(key: &str, value: &str) -> String {
    format!("{key}={}", utf8_percent_encode(value, SEGMENT))
}

/// Wraps the browser's request body for forwarding, keeping its content type.
pub(super) fn outbound_body(headers: &HeaderMap, body: &[u8]) -> Option<OutboundBody> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    OutboundBody::raw(content_type, body)
}

fn build_cors(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ]);

    match HeaderValue::from_str(&config.site_url.origin().ascii_serialization()) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "site origin is not a valid header value; CORS disabled");
            cors
        }
    }
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/change-password", post(auth::change_password))
        .route(
            "/api/auth/me",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route(
            "/api/admin/stores",
            get(admin::list_stores).post(admin::create_store),
        )
        .route(
            "/api/admin/stores/{id}",
            get(admin::store_item)
                .put(admin::store_item)
                .patch(admin::store_item)
                .delete(admin::store_item),
        )
        .route(
            "/api/admin/visitors/summary",
            get(admin::visitor_summary),
        )
        .route("/api/stores", get(stores::list_stores))
        .route("/api/stores/{id}", get(stores::get_store))
        .route("/api/stores/{id}/page", get(stores::store_page))
        .route(
            "/api/stores/{id}/reviews",
            get(stores::reviews).post(stores::reviews),
        )
        .route("/api/videos", get(content::list_videos))
        .route("/api/categories", get(content::list_categories))
        .route("/api/tracking-scripts", get(content::tracking_scripts))
        .route("/api/seo/page", get(content::seo_page))
        .route("/api/visitor/website", post(content::visit_website))
        .route("/api/visitor/store/{id}", post(content::visit_store))
        .route("/api/media/{*path}", get(media::proxy_media))
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new().route("/api/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(&state.config))
                .layer(axum::middleware::from_fn(request_id))
                .layer(SetResponseHeaderLayer::if_not_present(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                )),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                upstream: state.upstream.base_url().to_string(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}
