//! Error types for the generation clients

use super::transport::HttpResponse;
use thiserror::Error;

/// Errors raised while talking to a generative service
#[derive(Error, Debug)]
pub enum GenerationError {
    /// A backend was invoked without its API key
    #[error("Missing {service} API key")]
    MissingCredential {
        /// Which service's key is missing
        service: &'static str,
    },

    /// The service answered with a non-success status
    #[error("{service} returned HTTP {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Unexpected {service} response: {detail}")]
    ResponseShape {
        service: &'static str,
        detail: String,
    },

    /// Inline image data could not be decoded
    #[error("Invalid image data: {0}")]
    InvalidImageData(#[from] base64::DecodeError),

    /// The request never completed
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl GenerationError {
    /// Build a [`GenerationError::Status`] from a failed response
    ///
    /// Uses the upstream `error.message` (or `message`) field when the body
    /// is JSON, otherwise the start of the raw body.
    pub(crate) fn from_status(service: &'static str, response: &HttpResponse) -> Self {
        let text = response.text();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|json| {
                json.pointer("/error/message")
                    .or_else(|| json.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| text.chars().take(200).collect());
        GenerationError::Status {
            service,
            status: response.status,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_upstream_message() {
        let response = HttpResponse {
            status: 401,
            body: br#"{"error":{"message":"Incorrect API key provided"}}"#.to_vec(),
        };
        let err = GenerationError::from_status("OpenAI", &response);
        assert_eq!(
            err.to_string(),
            "OpenAI returned HTTP 401: Incorrect API key provided"
        );
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let response = HttpResponse {
            status: 502,
            body: b"Bad Gateway".to_vec(),
        };
        let err = GenerationError::from_status("Stability", &response);
        assert_eq!(err.to_string(), "Stability returned HTTP 502: Bad Gateway");
    }
}
