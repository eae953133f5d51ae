use serde::{Serialize, Deserialize};
use serde_json::Value;
use crate::error::ExchangeError;

pub const GENERIC_FAILURE_TEXT: &str = "Error connecting to the server";
pub const ERROR_LABEL: &str = "Error - ";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One transcript entry. Never mutated once it has been appended to the log.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into(), is_error: false }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { sender: Sender::Assistant, text: text.into(), is_error: false }
    }

    fn assistant_error(text: impl Into<String>) -> Self {
        Self { sender: Sender::Assistant, text: text.into(), is_error: true }
    }

    /// Turns the result of one exchange into the assistant entry shown to the user.
    pub fn from_outcome(outcome: Result<GenerateResponse, ExchangeError>) -> Self {
        match outcome {
            Ok(body) => match body.reply_text() {
                Some(text) => Self::assistant(text),
                None => Self::assistant_error(format!(
                    "{}{}",
                    ERROR_LABEL,
                    body.error_text().unwrap_or_else(|| "unknown error".to_string())
                )),
            },
            Err(e) => Self::assistant_error(e.user_message()),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
}

/// Reply body. Fields stay loosely typed: any truthy `response` counts as a reply.
#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl GenerateResponse {
    #[cfg(test)]
    pub fn reply(text: impl Into<String>) -> Self {
        Self { response: Some(Value::String(text.into())), error: None }
    }

    #[cfg(test)]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { response: None, error: Some(Value::String(error.into())) }
    }

    pub fn reply_text(&self) -> Option<String> {
        self.response.as_ref().and_then(display_text)
    }

    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().and_then(display_text)
    }
}

/// Display form of a JSON value; `None` for null, false, zero and the empty string.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
