//! Page fetching with read timeout.
//!
//! Uses async reqwest internally with tokio::time::timeout for stall detection,
//! but presents a sync interface so the harvester can pull posts from a plain
//! iterator.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::config::TelegramConfig;
use crate::error::FetchError;

/// Shared tokio runtime for HTTP operations.
///
/// Callers must not already be inside a runtime: `fetch` blocks on it.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("tgscrape-http")
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// HTTP client for preview pages. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct PageClient {
    http: reqwest::Client,
    read_timeout: Duration,
}

impl PageClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(2)
            .build()?;
        Ok(Self {
            http,
            read_timeout: config.read_timeout,
        })
    }

    /// GET `url` and return the body as text.
    ///
    /// Non-2xx statuses are errors. The whole request, headers and body,
    /// must complete within the read timeout.
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let read_timeout = self.read_timeout;
        SHARED_RUNTIME.handle().block_on(async {
            let request = async {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FetchError::from_reqwest(&e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        message: status.canonical_reason().unwrap_or("unknown").to_string(),
                        retry_after: retry_after(response.headers()),
                    });
                }
                response.text().await.map_err(|e| FetchError::from_reqwest(&e))
            };

            match tokio::time::timeout(read_timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(read_timeout)),
            }
        })
    }
}

/// `Retry-After` in delta-seconds form; HTTP-date values are ignored
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
