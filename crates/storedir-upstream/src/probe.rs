//! Ordered fallback across upstream paths whose naming differs between
//! backend versions.
//!
//! Candidates are tried one at a time, never in parallel. A 404 or 405 means
//! "this shape does not exist here" and moves on, as does a transport
//! failure. Any other status ends the walk and is relayed as-is. There is no
//! delay between attempts.

use reqwest::{Method, StatusCode};

use crate::client::{Forward, UpstreamClient};
use crate::response::{ProxyFailure, ProxyOutcome};

/// One guessed upstream method + path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub method: Method,
    pub path: String,
}

impl Candidate {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }
}

fn falls_through(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED
    )
}

impl UpstreamClient {
    /// Tries each candidate in order and returns the first response that is
    /// not a 404/405.
    ///
    /// When every candidate is exhausted, the last thing observed is
    /// returned: the final 404/405 response verbatim, or a 502 if the final
    /// attempt failed in transport. An empty candidate list is a 404
    /// `"Not Found"`.
    pub async fn probe(&self, candidates: &[Candidate], forward: &Forward<'_>) -> ProxyOutcome {
        let mut last: Option<ProxyOutcome> = None;

        for candidate in candidates {
            match self.send(&candidate.method, &candidate.path, forward).await {
                Ok(response) if falls_through(response.status) => {
                    tracing::debug!(
                        method = %candidate.method,
                        path = %candidate.path,
                        status = %response.status,
                        "upstream candidate missing, trying next"
                    );
                    last = Some(ProxyOutcome::Response(response));
                }
                Ok(response) => {
                    tracing::debug!(
                        method = %candidate.method,
                        path = %candidate.path,
                        status = %response.status,
                        "upstream candidate answered"
                    );
                    return ProxyOutcome::Response(response);
                }
                Err(error) => {
                    tracing::warn!(
                        method = %candidate.method,
                        path = %candidate.path,
                        error = %error,
                        "upstream candidate unreachable, trying next"
                    );
                    last = Some(ProxyOutcome::Failed(ProxyFailure::unreachable(&error)));
                }
            }
        }

        let outcome = last.unwrap_or_else(|| ProxyOutcome::Failed(ProxyFailure::not_found()));
        tracing::warn!(
            candidates = candidates.len(),
            status = %outcome.status(),
            "no upstream candidate matched"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_404_and_405_fall_through() {
        assert!(falls_through(StatusCode::NOT_FOUND));
        assert!(falls_through(StatusCode::METHOD_NOT_ALLOWED));
        assert!(!falls_through(StatusCode::OK));
        assert!(!falls_through(StatusCode::UNAUTHORIZED));
        assert!(!falls_through(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_not_found() {
        let client = UpstreamClient::with_base_url("http://localhost:4000", "ua", None)
            .expect("client");
        let auth = crate::AuthRelay::anonymous();
        let outcome = client.probe(&[], &Forward::new(&auth)).await;
        match outcome {
            ProxyOutcome::Failed(failure) => assert_eq!(failure, ProxyFailure::not_found()),
            ProxyOutcome::Response(_) => panic!("expected failure"),
        }
    }
}
