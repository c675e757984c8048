//! Client error types

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable response was received
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    Http { status: u16, message: String },

    /// The access credential expired and refreshing it failed; the user is signed out
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Error body shape shared with callers: `{ "message": ..., "status": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ClientError {
    /// Build an error from a failed response body.
    ///
    /// A JSON body carrying a string `message` supplies the message; anything
    /// else keeps the default transport message.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("message") {
                Some(serde_json::Value::String(message)) => Some(message.clone()),
                _ => None,
            })
            .unwrap_or_else(|| default_message(status));

        Self::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the caller should treat the user as signed out
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Caller-facing error shape
    pub fn to_body(&self) -> ApiErrorBody {
        match self {
            Self::Http { status, message } => ApiErrorBody {
                message: message.clone(),
                status: Some(*status),
            },
            other => ApiErrorBody {
                message: other.to_string(),
                status: other.status(),
            },
        }
    }
}

pub(crate) fn default_message(status: StatusCode) -> String {
    format!("Request failed with status code {}", status.as_u16())
}
