use thiserror::Error;
use crate::message::GENERIC_FAILURE_TEXT;

/// Why an exchange produced no decodable reply.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("could not decode reply: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl ExchangeError {
    /// Every variant renders the same text; the variant only reaches the logs.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_TEXT
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Unreachable(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
