//! Error types for request dispatch and completion.
//!
//! # Design
//! Only `AjaxError` is ever returned from `Ajax::request`, and only before a
//! transport exists. Status failures travel through the `error` callback and
//! promise rejection, so `StatusError` is a value handed to callbacks rather
//! than something the dispatcher returns. A body that claims a structured media
//! type but fails to parse surfaces as `DecodeError` from the readiness
//! listener, i.e. to whoever drove the transport, and never reaches `error`.

use thiserror::Error;

/// Errors returned synchronously by `Ajax::request`.
#[derive(Debug, Error)]
pub enum AjaxError {
    /// The configuration carries no `url`.
    #[error("You must provide options with a url")]
    MissingUrl,
}

/// Handed to the `error` callback when the terminal status is not valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Server responded with a status of {status}")]
pub struct StatusError {
    pub status: u16,
}

/// A response body could not be decoded with the strategy its media type selected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A serialized `RequestOptions` document could not be read.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid request options: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_names_the_status() {
        let err = StatusError { status: 503 };
        assert_eq!(err.to_string(), "Server responded with a status of 503");
    }

    #[test]
    fn missing_url_is_descriptive() {
        assert!(AjaxError::MissingUrl.to_string().contains("You must provide options"));
    }
}
