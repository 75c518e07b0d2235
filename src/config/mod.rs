use std::time::Duration;

/// Environment variable consulted by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "CRUDGRID_BASE_URL";

/// How the store treats non-success HTTP statuses on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    /// Mutate the snapshot once the request completes, whatever the status.
    #[default]
    Optimistic,
    /// Only 2xx responses mutate the snapshot; anything else is an error.
    Strict,
}

/// Client-side editor configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without the entity endpoint
    pub base_url: String,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,

    /// How long a delete confirmation waits before expiring
    pub confirm_timeout: Duration,

    /// How long transient notifications stay visible
    pub notification_ttl: Duration,

    /// Write acknowledgement handling
    pub ack_policy: AckPolicy,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
            confirm_timeout: Duration::from_secs(5),
            notification_ttl: Duration::from_secs(4),
            ack_policy: AckPolicy::Optimistic,
        }
    }

    /// Reads the base URL from `CRUDGRID_BASE_URL`, falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set confirmation expiry
    pub fn confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Set notification lifetime
    pub fn notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }

    /// Set acknowledgement policy
    pub fn ack_policy(mut self, policy: AckPolicy) -> Self {
        self.ack_policy = policy;
        self
    }

    /// Full collection URL for an endpoint
    pub fn collection_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_matches('/'))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err("base_url must start with http:// or https://".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }

        if self.confirm_timeout.is_zero() {
            return Err("confirm_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:3000")
    }
}
