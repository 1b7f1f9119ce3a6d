// SPDX-License-Identifier: GPL-3.0-or-later

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Failure talking to the metadata provider.
///
/// The display string is what ends up in front of the user, so API payload
/// errors render as the provider's own message.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or protocol failure while performing the request.
    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status without an error payload.
    #[error("Network response was not ok (HTTP {status}).")]
    HttpStatus { status: StatusCode, body: String },

    /// The response carried an `error` code, even if the status was 200.
    #[error("{message}")]
    Api { code: Option<i64>, message: String },

    /// The payload did not match the expected shape.
    #[error("Unexpected response from Last.fm: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Rate limiter closed")]
    RateLimiterClosed,
}
