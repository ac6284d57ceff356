use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::RequestBuilder;

/// Credentials lifted off a browser request and re-attached to upstream calls.
///
/// The token is opaque: it is neither parsed nor validated here. When both a
/// cookie and an `Authorization` header are present, both are forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRelay {
    cookie: Option<String>,
    authorization: Option<String>,
}

impl AuthRelay {
    /// Builds a relay from the auth cookie value and the raw `Authorization`
    /// header. Empty values are treated as absent.
    #[must_use]
    pub fn new(cookie_name: &str, token: Option<&str>, authorization: Option<&str>) -> Self {
        let cookie = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("{cookie_name}={t}"));
        let authorization = authorization
            .filter(|a| !a.trim().is_empty())
            .map(ToOwned::to_owned);
        Self {
            cookie,
            authorization,
        }
    }

    /// A relay that forwards nothing.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The outbound `Cookie` header value, e.g. `token=abc123`.
    #[must_use]
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.cookie.is_some() || self.authorization.is_some()
    }

    pub(crate) fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(authorization) = &self.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_serialized_with_configured_name() {
        let relay = AuthRelay::new("token", Some("abc123"), None);
        assert_eq!(relay.cookie_header(), Some("token=abc123"));
        assert_eq!(relay.authorization(), None);
        assert!(relay.has_credentials());
    }

    #[test]
    fn missing_cookie_produces_no_cookie_header() {
        let relay = AuthRelay::new("token", None, None);
        assert_eq!(relay.cookie_header(), None);
        assert!(!relay.has_credentials());
        assert_eq!(relay, AuthRelay::anonymous());
    }

    #[test]
    fn blank_values_are_dropped() {
        let relay = AuthRelay::new("token", Some("  "), Some(""));
        assert!(!relay.has_credentials());
    }

    #[test]
    fn cookie_and_authorization_are_both_kept() {
        let relay = AuthRelay::new("sid", Some("xyz"), Some("Bearer other"));
        assert_eq!(relay.cookie_header(), Some("sid=xyz"));
        assert_eq!(relay.authorization(), Some("Bearer other"));
    }
}
