//! HTTP client wrapper for document and code-list downloads.

use std::thread;

use reqwest::blocking::Client;

use crate::config::{HttpConfig, RetryPolicy};
use crate::error::{FimError, Result};

/// User agent string identifying this converter.
const USER_AGENT: &str = concat!("ozg-xdatenfelder/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` with the configured timeout and user agent.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download content from a URL with retry logic.
///
/// Uses exponential backoff for transient failures (network errors, 5xx
/// responses). Client errors (4xx) fail immediately.
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to download from
/// * `retry` - How often and how long to retry
///
/// # Returns
/// Raw bytes of the response body
pub fn download_bytes(client: &Client, url: &str, retry: &RetryPolicy) -> Result<Vec<u8>> {
    let max_attempts = retry.max_attempts.max(1);
    let mut last_error: Option<String> = None;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let delay = retry.delay_for(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, url, "Retrying after delay");
            thread::sleep(delay);
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_attempts,
                        url,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                let response = response.error_for_status()?;
                let bytes = response.bytes()?;
                return Ok(bytes.to_vec());
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts,
                        url,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(FimError::Http(e));
            }
        }
    }

    Err(FimError::RetriesExhausted {
        attempts: max_attempts,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Download a URL and decode the body as UTF-8.
pub fn download_text(client: &Client, url: &str, retry: &RetryPolicy) -> Result<String> {
    let bytes = download_bytes(client, url, retry)?;
    Ok(bytes_to_string(bytes, url))
}

/// Decode bytes as UTF-8, replacing invalid sequences.
///
/// FIM portals occasionally serve mis-encoded exports; a warning is logged
/// instead of failing the download.
pub fn bytes_to_string(bytes: Vec<u8>, source: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(source, "Response is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
