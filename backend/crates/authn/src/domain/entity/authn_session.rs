//! Authentication Session Entity
//!
//! A login in progress. The identity step is finished when the session is
//! created; any MFA step follows. Fields are private so that the finished
//! steps always stay a prefix of the required steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::principal::{Principal, PrincipalInfo};
use crate::domain::value_object::{
    ids::{PrincipalId, UserId},
    provider_type::ProviderType,
    session_step::{SessionCreateReason, SessionStep},
};
use crate::error::{AuthnError, AuthnResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnSession {
    client_id: String,
    user_id: UserId,
    principal_id: PrincipalId,
    principal_type: ProviderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    principal_updated_at: Option<DateTime<Utc>>,
    required_steps: Vec<SessionStep>,
    finished_steps: Vec<SessionStep>,
    session_create_reason: SessionCreateReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authenticator_bearer_token: Option<String>,
}

impl AuthnSession {
    /// Required steps are `identity` followed by `mfa_step` when given;
    /// `identity` is already finished.
    pub fn new(
        client_id: impl Into<String>,
        principal: &Principal,
        mfa_step: Option<SessionStep>,
        reason: SessionCreateReason,
    ) -> Self {
        let mut required_steps = vec![SessionStep::Identity];
        required_steps.extend(mfa_step.filter(SessionStep::is_mfa));
        let finished_steps = required_steps[..1].to_vec();

        Self {
            client_id: client_id.into(),
            user_id: principal.principal_user_id(),
            principal_id: principal.principal_id(),
            principal_type: principal.provider_type(),
            principal_updated_at: principal.updated_at(),
            required_steps,
            finished_steps,
            session_create_reason: reason,
            authenticator_bearer_token: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn principal_type(&self) -> ProviderType {
        self.principal_type
    }

    pub fn principal_updated_at(&self) -> Option<DateTime<Utc>> {
        self.principal_updated_at
    }

    pub fn required_steps(&self) -> &[SessionStep] {
        &self.required_steps
    }

    pub fn finished_steps(&self) -> &[SessionStep] {
        &self.finished_steps
    }

    pub fn session_create_reason(&self) -> SessionCreateReason {
        self.session_create_reason
    }

    pub fn authenticator_bearer_token(&self) -> Option<&str> {
        self.authenticator_bearer_token.as_deref()
    }

    pub fn set_authenticator_bearer_token(&mut self, token: impl Into<String>) {
        self.authenticator_bearer_token = Some(token.into());
    }

    pub fn is_finished(&self) -> bool {
        self.finished_steps.len() == self.required_steps.len()
    }

    pub fn next_step(&self) -> Option<SessionStep> {
        self.required_steps.get(self.finished_steps.len()).copied()
    }

    /// Mark `step` finished. Only the next required step may be finished.
    pub fn finish_step(&mut self, step: SessionStep) -> AuthnResult<()> {
        match self.next_step() {
            Some(next) if next == step => {
                self.finished_steps.push(step);
                Ok(())
            }
            _ => Err(AuthnError::InvalidAuthenticationSession),
        }
    }

    /// Structural invariant, checked on every decoded session.
    pub fn is_consistent(&self) -> bool {
        self.required_steps.first() == Some(&SessionStep::Identity)
            && !self.finished_steps.is_empty()
            && self.finished_steps.len() <= self.required_steps.len()
            && self.required_steps.starts_with(&self.finished_steps)
    }
}
