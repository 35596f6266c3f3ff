//! Step Result
//!
//! What the session machine hands back to the API layer: either a finished
//! login with a session, or a continuation token naming the next step.

use std::fmt;

use crate::domain::entity::{
    identity::Identity, principal::Principal, session::Session, user::User,
};
use crate::domain::value_object::session_step::SessionStep;
use crate::error::AuthnError;

#[derive(Clone)]
pub struct CompletionResult {
    pub user: User,
    pub principal: Principal,
    pub identity: Identity,
    pub session: Session,
    pub access_token: String,
    pub authenticator_bearer_token: Option<String>,
}

impl fmt::Debug for CompletionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionResult")
            .field("user", &self.user)
            .field("principal", &self.principal)
            .field("session", &self.session)
            .field("access_token", &"[REDACTED]")
            .field(
                "authenticator_bearer_token",
                &self.authenticator_bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgressResult {
    pub token: String,
    pub step: SessionStep,
}

impl InProgressResult {
    /// Error form, for transports that report continuation as a failure.
    pub fn into_error(self) -> AuthnError {
        AuthnError::AuthenticationSessionRequired {
            token: self.token,
            step: self.step,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StepResult {
    Completed(Box<CompletionResult>),
    InProgress(InProgressResult),
}

impl StepResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepResult::Completed(_))
    }

    /// Completed result, or the continuation as `AuthenticationSessionRequired`.
    pub fn into_completed(self) -> Result<CompletionResult, AuthnError> {
        match self {
            StepResult::Completed(result) => Ok(*result),
            StepResult::InProgress(pending) => Err(pending.into_error()),
        }
    }
}
