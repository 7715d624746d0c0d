//! Web preview client settings

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://t.me";

pub const DEFAULT_USER_AGENT: &str = concat!("tgscrape/", env!("CARGO_PKG_VERSION"));

/// No response within this window counts as a stall
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound on any single retry sleep, including server `Retry-After`
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    /// Scheme and host of the preview site, without trailing slash
    pub base_url: String,
    pub user_agent: String,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Backoff for retry `n` is `backoff_base * 2^n`
    pub backoff_base: Duration,
    pub max_backoff: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs(1),
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl TelegramConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Preview page URL for `channel`, optionally only posts older than `before`
    pub fn channel_url(&self, channel: &str, before: Option<u64>) -> String {
        let base = self.base_url.trim_end_matches('/');
        match before {
            Some(id) => format!("{base}/s/{channel}?before={id}"),
            None => format!("{base}/s/{channel}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TelegramConfig::default();
        assert_eq!(config.base_url, "https://t.me");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.max_backoff, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("tgscrape/"));
    }

    #[test]
    fn channel_url_first_and_next_page() {
        let config = TelegramConfig::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(
            config.channel_url("durov", None),
            "http://127.0.0.1:8080/s/durov"
        );
        assert_eq!(
            config.channel_url("durov", Some(42)),
            "http://127.0.0.1:8080/s/durov?before=42"
        );
    }
}
