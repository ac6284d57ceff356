use std::net::SocketAddr;

use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Root of the upstream REST API every proxy route forwards to.
    pub api_base_url: Url,
    /// Public origin of the site, used for CORS and absolute links.
    pub site_url: Url,
    pub auth_cookie_name: String,
    pub auth_cookie_max_age_days: i64,
    /// `None` leaves outbound requests without a total timeout.
    pub upstream_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl AppConfig {
    /// Auth cookies are only marked `Secure` when served in production.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        matches!(self.env, Environment::Production)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("site_url", &self.site_url.as_str())
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("auth_cookie_max_age_days", &self.auth_cookie_max_age_days)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
