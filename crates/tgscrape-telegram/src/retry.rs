//! Retry with exponential backoff for page fetches

use std::time::Duration;

use crate::error::FetchError;

/// Exponential backoff: `base * 2^attempt` (2s, 4s, 8s, ... for a 1s base)
pub fn backoff_duration(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Sleep before retry `attempt`: the longer of the backoff and the server's
/// `Retry-After`, never more than `max_wait`
pub fn retry_wait(
    base: Duration,
    attempt: u32,
    retry_after: Option<Duration>,
    max_wait: Duration,
) -> Duration {
    backoff_duration(base, attempt)
        .max(retry_after.unwrap_or_default())
        .min(max_wait)
}

/// Retry a fallible fetch with exponential backoff.
///
/// On retryable errors, logs the failure, sleeps for [`retry_wait`], and
/// retries up to `max_retries` times.
///
/// Returns `Ok(T)` on first success, or the final `Err` on exhaustion / non-retryable error.
pub fn retry_with_backoff<T>(
    label: &str,
    max_retries: u32,
    base: Duration,
    max_wait: Duration,
    mut attempt_fn: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                attempt += 1;
                let wait = retry_wait(base, attempt, e.retry_after(), max_wait);
                log::warn!("{label}: attempt {attempt}/{max_retries} failed: {e}, retrying in {wait:?}");
                std::thread::sleep(wait);
            }
            Err(e) => {
                log::debug!("{label}: giving up: {e}");
                return Err(e);
            }
        }
    }
}
