//! Client configuration.
//!
//! Values come from the environment (optionally seeded from a `.env` file
//! by the binary) and fall back to defaults suitable for a local API.

use std::env;
use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default name of the tenant-scoping header.
pub const DEFAULT_TENANT_HEADER: &str = "x-tenant-id";

/// Default number of attendees per summary page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Ticket service client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API; endpoint paths are appended to it.
    pub api_url: String,

    /// Header carrying the tenant id.
    ///
    /// Default: `x-tenant-id`
    pub tenant_header: String,

    /// Per-request timeout.
    ///
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Attendees shown per summary page.
    ///
    /// Default: 5
    pub page_size: usize,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `TURNSTILE_API_URL` (default `http://localhost:8080/api`)
    /// - `TURNSTILE_TENANT_HEADER` (default `x-tenant-id`)
    /// - `TURNSTILE_TIMEOUT_SECS` (default 10)
    /// - `TURNSTILE_PAGE_SIZE` (default 5)
    ///
    /// Unparseable or zero values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_url: lookup("TURNSTILE_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            tenant_header: lookup("TURNSTILE_TENANT_HEADER")
                .filter(|header| !header.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TENANT_HEADER.to_string()),
            timeout: Duration::from_secs(
                lookup("TURNSTILE_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            page_size: lookup("TURNSTILE_PAGE_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Set the tenant header name.
    #[must_use]
    pub fn with_tenant_header(mut self, header: impl Into<String>) -> Self {
        self.tenant_header = header.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the summary page size (zero is treated as one).
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 { 1 } else { page_size };
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
