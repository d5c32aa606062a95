//! Error types for Lydia.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Identity-provider errors. Surfaced inline on the sign-in / sign-up screens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("An account already exists for {email}")]
    AccountExists { email: String },

    #[error("Identity provider failed: {reason}")]
    Provider { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Session transition attempted from a state that does not allow it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session is still loading")]
    Loading,

    #[error("No authenticated identity")]
    NotAuthenticated,

    #[error("Signed-in identity changed before the transition applied")]
    IdentityChanged,
}

/// Errors from the AI text / voice collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// A required request field was empty, e.g. "Message is required".
    #[error("{0}")]
    EmptyInput(&'static str),

    #[error("{provider} API key is not configured")]
    NotConfigured { provider: &'static str },

    #[error("{provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("{provider} API error: {status} - {body}")]
    Upstream {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("{provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

impl AssistantError {
    /// Whether the collaborator could not be reached at all (as opposed to
    /// answering with an error).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::Timeout { .. })
    }
}

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Form validation failure: every violated rule, in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Messages reported for one field.
    pub fn messages_for(&self, field: &str) -> Vec<&'static str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message)
            .collect()
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join(" ")
}
