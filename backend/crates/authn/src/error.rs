//! Authn Error Types
//!
//! Every failure the authentication core can report, plus the mapping onto the
//! unified `kernel::error::AppError` used by outer layers.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use serde_json::json;
use thiserror::Error;

use crate::domain::value_object::{
    ids::UserId, session_step::SessionStep, validation::ValidationCause,
};

/// Authn-specific result type alias
pub type AuthnResult<T> = Result<T, AuthnError>;

/// Authn-specific error variants
#[derive(Debug, Error)]
pub enum AuthnError {
    /// Unknown login ID, wrong password, or ambiguous principal lookup
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A login ID or federated email is already owned by another account
    #[error("login ID is already used")]
    LoginIdAlreadyUsed,

    /// Store-level uniqueness violation; the use cases translate it before it
    /// reaches a caller
    #[error("record already exists")]
    AlreadyExists,

    #[error("user is already linked to this provider")]
    AlreadyLinked,

    #[error("not found")]
    NotFound,

    /// More than one record matched a lookup that expects exactly one
    #[error("multiple results found")]
    MultipleResultsFound,

    #[error("{message}")]
    ValidationFailed {
        message: String,
        causes: Vec<ValidationCause>,
    },

    #[error("password policy violated")]
    PasswordPolicyViolated(Vec<ValidationCause>),

    /// Continuation token is forged, expired or malformed
    #[error("invalid authentication session")]
    InvalidAuthenticationSession,

    /// The session needs another step; `token` resumes it
    #[error("authentication session requires step {step}")]
    AuthenticationSessionRequired { token: String, step: SessionStep },

    /// An existing user must be linked instead of creating a new one.
    /// Always consumed inside the OAuth flow.
    #[error("merge into existing user {user_id} required")]
    MergeRequired { user_id: UserId },

    #[error("event rejected by hook: {0}")]
    EventRejected(String),

    #[error("store error: {0}")]
    Store(String),

    /// Configuration or programming defect (e.g. unregistered provider type)
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthnError {
    /// Validation failure carrying structured causes.
    pub fn validation_failed(causes: Vec<ValidationCause>) -> Self {
        AuthnError::ValidationFailed {
            message: "invalid request body".to_string(),
            causes,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthnError::InvalidCredentials | AuthnError::InvalidAuthenticationSession => {
                ErrorKind::Unauthorized
            }
            AuthnError::LoginIdAlreadyUsed
            | AuthnError::AlreadyExists
            | AuthnError::AlreadyLinked => ErrorKind::Conflict,
            AuthnError::NotFound => ErrorKind::NotFound,
            AuthnError::ValidationFailed { .. } => ErrorKind::BadRequest,
            AuthnError::PasswordPolicyViolated(_) => ErrorKind::BadRequest,
            AuthnError::AuthenticationSessionRequired { .. } => ErrorKind::Unauthorized,
            AuthnError::EventRejected(_) => ErrorKind::Forbidden,
            AuthnError::MultipleResultsFound
            | AuthnError::MergeRequired { .. }
            | AuthnError::Fatal(_)
            | AuthnError::Internal(_) => ErrorKind::InternalServerError,
            AuthnError::Store(_) => ErrorKind::ServiceUnavailable,
        }
    }

    /// Convert to AppError. Server-side details never leave the process.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthnError::ValidationFailed { message, causes } => {
                AppError::new(self.kind(), message.clone()).with_details(json!(causes))
            }
            AuthnError::PasswordPolicyViolated(causes) => {
                AppError::new(self.kind(), self.to_string()).with_details(json!(causes))
            }
            AuthnError::AuthenticationSessionRequired { token, step } => {
                AppError::new(self.kind(), self.to_string())
                    .with_details(json!({ "token": token, "step": step }))
            }
            AuthnError::InvalidAuthenticationSession => {
                AppError::new(self.kind(), self.to_string()).with_action("Sign in again")
            }
            _ if self.kind().is_server_error() => {
                AppError::new(self.kind(), self.kind().as_str())
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthnError::Fatal(msg) => {
                tracing::error!(message = %msg, "Authn configuration defect");
            }
            AuthnError::Store(msg) => {
                tracing::error!(message = %msg, "Authn store error");
            }
            AuthnError::Internal(msg) => {
                tracing::error!(message = %msg, "Authn internal error");
            }
            AuthnError::MergeRequired { user_id } => {
                tracing::error!(user_id = %user_id, "Merge signal escaped the OAuth flow");
            }
            AuthnError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthnError::InvalidAuthenticationSession => {
                tracing::warn!("Invalid authentication session token");
            }
            AuthnError::EventRejected(reason) => {
                tracing::info!(reason = %reason, "Event rejected by hook");
            }
            _ => {
                tracing::debug!(error = %self, "Authn error");
            }
        }
    }

    /// Log, then convert. Entry point for the layer that renders responses.
    pub fn into_app_error(self) -> AppError {
        self.log();
        self.to_app_error()
    }
}

impl From<AppError> for AuthnError {
    fn from(err: AppError) -> Self {
        AuthnError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AuthnError {
    fn from(err: serde_json::Error) -> Self {
        AuthnError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthnError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthnError::Internal(err.to_string())
    }
}
