use crate::io::ApiError;

use super::validation::ValidationIssue;

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session has expired. Reload the page and sign in again; unsaved changes are kept here.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong while saving. Please try again.";
pub const SAVED_MESSAGE: &str = "Progress saved.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
    /// Needs a reload before anything else can be persisted.
    SessionExpired,
}

/// A user-facing toast produced by a wizard action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    /// A non-empty server message wins over the generic text, except for
    /// session expiry which always gets its dedicated message.
    pub fn from_api_error(err: &ApiError) -> Self {
        match err {
            ApiError::SessionExpired { .. } => {
                Self::new(NoticeKind::SessionExpired, SESSION_EXPIRED_MESSAGE)
            }
            ApiError::Validation { message, .. } => {
                let text = err
                    .first_field_error()
                    .map(|(_, first)| first)
                    .unwrap_or(message.as_str());
                Self::error(text)
            }
            other => Self::error(other.server_message().unwrap_or(GENERIC_ERROR_MESSAGE)),
        }
    }

    pub fn from_validation(issue: &ValidationIssue) -> Self {
        Self::error(issue.message.clone())
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error | NoticeKind::SessionExpired)
    }
}
