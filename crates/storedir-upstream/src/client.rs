//! HTTP client for the upstream REST API.
//!
//! Wraps `reqwest` with base-URL joining, credential relay, and response
//! draining. Nothing here interprets upstream status codes: callers decide
//! whether a 4xx/5xx is relayed or treated as a fallthrough.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use storedir_core::AppConfig;

use crate::auth::AuthRelay;
use crate::error::UpstreamError;
use crate::response::{ProxyFailure, ProxyOutcome, UpstreamResponse};

/// Request body forwarded to the upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Json(serde_json::Value),
    Raw {
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl OutboundBody {
    /// Wraps a raw browser body; an empty body yields `None`.
    #[must_use]
    pub fn raw(content_type: Option<&str>, bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self::Raw {
            content_type: content_type.map(ToOwned::to_owned),
            bytes: bytes.to_vec(),
        })
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            OutboundBody::Json(value) => builder.json(value),
            OutboundBody::Raw {
                content_type,
                bytes,
            } => {
                let builder = builder.header(
                    CONTENT_TYPE,
                    content_type.as_deref().unwrap_or("application/json"),
                );
                builder.body(bytes.clone())
            }
        }
    }
}

/// Everything about an outbound call except its method and path.
///
/// One `Forward` is shared by every candidate a prober tries.
#[derive(Debug, Clone, Copy)]
pub struct Forward<'a> {
    pub auth: &'a AuthRelay,
    pub query: Option<&'a str>,
    pub body: Option<&'a OutboundBody>,
}

impl<'a> Forward<'a> {
    #[must_use]
    pub fn new(auth: &'a AuthRelay) -> Self {
        Self {
            auth,
            query: None,
            body: None,
        }
    }

    /// Raw query string without the leading `?`; empty strings are ignored.
    #[must_use]
    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<&'a OutboundBody>) -> Self {
        self.body = body;
        self
    }
}

/// Client for the upstream REST API.
///
/// Use [`UpstreamClient::from_config`] in the server or
/// [`UpstreamClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    /// Creates a client from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        Self::with_base_url(
            config.api_base_url.as_str(),
            &config.user_agent,
            config.upstream_timeout_secs,
        )
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`UpstreamError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout_secs: Option<u64>,
    ) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent.to_owned());
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let base_url = Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base URL, keeping any path prefix the base
    /// carries (`http://api/v1` + `/stores` is `http://api/v1/stores`).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidUrl`] if the joined URL does not parse.
    pub fn url(&self, path: &str, query: Option<&str>) -> Result<Url, UpstreamError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        let mut url = Url::parse(&joined).map_err(|e| UpstreamError::InvalidUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })?;
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Sends one request and drains the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] on network failure or when the body
    /// cannot be read, [`UpstreamError::InvalidUrl`] if the path is unusable.
    pub async fn send(
        &self,
        method: &Method,
        path: &str,
        forward: &Forward<'_>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url(path, forward.query)?;
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json, text/plain, */*");
        builder = forward.auth.apply(builder);
        if let Some(body) = forward.body {
            builder = body.apply(builder);
        }

        let response = builder.send().await?;
        UpstreamResponse::read(response).await
    }

    /// Forwards to exactly one upstream path and returns whatever it says.
    ///
    /// Transport failures become a 502 [`ProxyFailure`] carrying the error
    /// message.
    pub async fn relay(&self, method: &Method, path: &str, forward: &Forward<'_>) -> ProxyOutcome {
        match self.send(method, path, forward).await {
            Ok(response) => {
                tracing::debug!(%method, path, status = %response.status, "upstream relay");
                ProxyOutcome::Response(response)
            }
            Err(error) => {
                tracing::error!(%method, path, error = %error, "upstream relay failed");
                ProxyOutcome::Failed(ProxyFailure::unreachable(&error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> UpstreamClient {
        UpstreamClient::with_base_url(base_url, "storedir-test", None)
            .expect("client construction should not fail")
    }

    #[test]
    fn url_joins_path_onto_bare_host() {
        let client = test_client("http://localhost:4000");
        let url = client.url("/auth/login", None).expect("url");
        assert_eq!(url.as_str(), "http://localhost:4000/auth/login");
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let client = test_client("https://api.example.com/api/");
        let url = client.url("/stores", Some("page=2&q=coffee")).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/api/stores?page=2&q=coffee");
    }

    #[test]
    fn url_ignores_empty_query() {
        let client = test_client("https://api.example.com/api");
        let url = client.url("categories", Some("")).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/api/categories");
    }

    #[test]
    fn with_base_url_rejects_garbage() {
        let result = UpstreamClient::with_base_url("not a url", "ua", None);
        assert!(matches!(result, Err(UpstreamError::InvalidUrl { .. })));
    }

    #[test]
    fn raw_body_is_none_when_empty() {
        assert!(OutboundBody::raw(Some("application/json"), b"").is_none());
        assert!(OutboundBody::raw(None, b"{}").is_some());
    }
}
