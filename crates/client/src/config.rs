use std::time::Duration;

/// Default backend base URL for local development.
const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cache TTL in seconds. Matches the ~2-minute window list and
/// detail views tolerate stale data for.
const DEFAULT_CACHE_TTL_SECS: u64 = 120;

/// Client configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (default: `http://localhost:3000`).
    pub base_url: String,
    /// Per-request timeout (default: 30 s).
    pub request_timeout: Duration,
    /// Default TTL for cached read results (default: 120 s).
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `CAMPUSMARKET_API_URL`        | `http://localhost:3000` |
    /// | `CAMPUSMARKET_TIMEOUT_SECS`   | `30`                    |
    /// | `CAMPUSMARKET_CACHE_TTL_SECS` | `120`                   |
    ///
    /// Binaries should call `dotenvy::dotenv().ok()` before this so a
    /// local `.env` file is honoured.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("CAMPUSMARKET_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let timeout_secs: u64 = std::env::var("CAMPUSMARKET_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("CAMPUSMARKET_TIMEOUT_SECS must be a valid u64");

        let cache_ttl_secs: u64 = std::env::var("CAMPUSMARKET_CACHE_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_CACHE_TTL_SECS.to_string())
            .parse()
            .expect("CAMPUSMARKET_CACHE_TTL_SECS must be a valid u64");

        Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}
