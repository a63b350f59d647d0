//! Fetches network media into memory so it can be decoded like a file.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_LENGTH;
use tracing::debug;

use crate::error::EngineError;

/// Downloads `url` in full.
///
/// Uses the blocking client, so this must not be called from inside an async
/// runtime. The engine only calls it from host or dispatcher threads.
pub fn fetch(url: &str, timeout: Duration) -> Result<Bytes, EngineError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;

    let response = client.get(url).send()?.error_for_status()?;

    let content_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    debug!(url, ?content_length, "fetching network media");

    let body = response.bytes()?;
    debug!(url, bytes = body.len(), "network media fetched");
    Ok(body)
}
