//! Client settings and their defaults.

use std::time::Duration;

/// Base URL used when none is supplied.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";
/// Bound on establishing a TCP/TLS connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Bound on submitting a command and receiving its response headers.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Whole-request bound for uploads.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
/// Wait after a command's output stream ends before returning.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Settings for a [`crate::RemoteServiceClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server endpoint, e.g. `http://host:9000`.
    pub base_url: String,
    /// Connection establishment bound, applied to every request.
    pub connect_timeout: Duration,
    /// Whole-request bound for the JSON endpoints; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Default submission bound for `run` and `run_bg`.
    pub submit_timeout: Duration,
    /// Default whole-request bound for uploads.
    pub upload_timeout: Duration,
    /// Default quiescence delay after a drained stream ends.
    pub settle_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl ClientConfig {
    /// Defaults pointed at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Override the connection bound.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound every JSON request.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the command submission bound.
    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Override the upload bound.
    #[must_use]
    pub const fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Override the quiescence delay; `Duration::ZERO` disables it.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = ClientConfig::new("http://example:1234")
            .with_settle_delay(Duration::ZERO)
            .with_request_timeout(Some(Duration::from_secs(3)));
        assert_eq!(config.base_url, "http://example:1234");
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.submit_timeout, DEFAULT_SUBMIT_TIMEOUT);
    }

    #[test]
    fn default_targets_local_server() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert!(config.request_timeout.is_none());
    }
}
