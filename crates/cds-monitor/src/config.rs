//! Dashboard configuration.

use std::time::Duration;

use crate::error::{MonitorError, MonitorResult};

/// Fallback UI base URL until the API reports the real one.
pub const DEFAULT_UI_URL: &str = "http://cds.ui/";

/// Configuration for the monitoring dashboard.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the CDS API.
    pub api_url: String,
    /// Username used to look up admin rights.
    pub username: Option<String>,
    /// Session token sent with each request.
    pub session_token: Option<String>,
    /// Interval between two data refreshes.
    pub refresh_interval: Duration,
    /// Interval between two redraws.
    pub render_interval: Duration,
    /// Timeout applied to each API request.
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8081".to_string(),
            username: None,
            session_token: None,
            refresh_interval: Duration::from_secs(2),
            render_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for the given API URL.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Set the username.
    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self
    }

    /// Set the session token.
    #[must_use]
    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Set the refresh interval.
    #[must_use]
    pub const fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the render interval.
    #[must_use]
    pub const fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> MonitorResult<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(MonitorError::Config(format!(
                "invalid API URL: {}, must start with http:// or https://",
                self.api_url
            )));
        }
        if self.refresh_interval.is_zero() || self.render_interval.is_zero() {
            return Err(MonitorError::Config("intervals must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(2));
        assert_eq!(config.render_interval, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = MonitorConfig::new("https://cds.example/api")
            .with_username(Some("alice".into()))
            .with_session_token(Some(String::new()))
            .with_request_timeout(Duration::from_secs(3));
        assert_eq!(config.username.as_deref(), Some("alice"));
        assert!(config.session_token.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_url() {
        let config = MonitorConfig::new("ws://cds");
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn rejects_zero_interval() {
        let config = MonitorConfig::default().with_refresh_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
