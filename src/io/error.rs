use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::form::LookupFailure;

/// Failure of a call to the survey backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// 419 (CSRF token expired) or 403 (token rejected). The user has to
    /// reload before retrying.
    #[error("session expired (HTTP {status})")]
    SessionExpired { status: u16 },
    /// 422 with per-field messages.
    #[error("{message}")]
    Validation {
        message: String,
        errors: IndexMap<String, Vec<String>>,
    },
    #[error("server error (HTTP {status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server { status: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: IndexMap<String, Vec<String>>,
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    /// Message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Validation { message, .. } => Some(message),
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// First field error of a 422 response, in server order.
    pub fn first_field_error(&self) -> Option<(&str, &str)> {
        match self {
            ApiError::Validation { errors, .. } => errors.iter().find_map(|(field, messages)| {
                messages.first().map(|message| (field.as_str(), message.as_str()))
            }),
            _ => None,
        }
    }
}

/// Maps a non-2xx status and its body to an [`ApiError`].
pub fn classify_failure(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.filter(|message| !message.trim().is_empty());
    match status {
        403 | 419 => ApiError::SessionExpired { status },
        422 => ApiError::Validation {
            message: message.unwrap_or_else(|| "The given data was invalid.".to_string()),
            errors: parsed.errors,
        },
        _ => ApiError::Server { status, message },
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<ApiError> for LookupFailure {
    fn from(err: ApiError) -> Self {
        LookupFailure(err.to_string())
    }
}
