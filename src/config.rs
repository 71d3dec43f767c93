use std::env;
use std::fmt;
use std::time::Duration;

/// Base URL used when `DATADOG_HOST` is not set.
pub const DEFAULT_BASE_URL: &str = "https://app.datadoghq.com";

/// Environment variable overriding the base URL at construction.
pub const BASE_URL_ENV: &str = "DATADOG_HOST";

/// Runtime configuration for a Datadog API client.
///
/// Treated as read-only once a client is built from it; derive a new client
/// (`Client::with_keys`, `Client::with_base_url`) instead of mutating it.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub app_key: String,
    pub base_url: String,
    /// Max elapsed retry time for the default backoff. `None` means unset.
    pub retry_timeout: Option<Duration>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Config {
    /// Configuration for the given keys; the base URL comes from `DATADOG_HOST`
    /// when set.
    pub fn new(api_key: impl Into<String>, app_key: impl Into<String>) -> Self {
        let base_url = env::var(BASE_URL_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            api_key: api_key.into(),
            app_key: app_key.into(),
            base_url: normalize_base_url(&base_url),
            retry_timeout: None,
            timeout_secs: 30,
            user_agent: format!("datadog-api/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - DATADOG_API_KEY (or DD_API_KEY) [required]
    /// - DATADOG_APP_KEY (or DD_APP_KEY) [required]
    /// - DATADOG_HOST (default: https://app.datadoghq.com)
    /// - DATADOG_RETRY_TIMEOUT_SECS (default: unset, 60s backoff ceiling)
    /// - DATADOG_HTTP_TIMEOUT_SECS (default: 30)
    /// - DATADOG_USER_AGENT (default: datadog-api/<version>)
    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("DATADOG_API_KEY")
            .or_else(|_| env::var("DD_API_KEY"))
            .map_err(|_| "Missing DATADOG_API_KEY or DD_API_KEY".to_string())?;
        let app_key = env::var("DATADOG_APP_KEY")
            .or_else(|_| env::var("DD_APP_KEY"))
            .map_err(|_| "Missing DATADOG_APP_KEY or DD_APP_KEY".to_string())?;

        let mut cfg = Self::new(api_key, app_key);
        cfg.retry_timeout = env::var("DATADOG_RETRY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        if let Some(secs) = env::var("DATADOG_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout_secs = secs;
        }
        if let Ok(ua) = env::var("DATADOG_USER_AGENT") {
            cfg.user_agent = ua;
        }
        Ok(cfg)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn with_retry_timeout(mut self, timeout: Duration) -> Self {
        self.retry_timeout = Some(timeout);
        self
    }
}

// Keys stay out of Debug output so configs can be logged.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retry_timeout", &self.retry_timeout)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
