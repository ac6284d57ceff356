use thiserror::Error;

/// Errors raised while talking to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network, TLS, or body-read failure from the underlying HTTP client.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A base URL or joined path could not be parsed.
    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
