//! OAuth Coordinator
//!
//! Turns a federated login or link into a single-use authorization code, and
//! exchanges that code (with its PKCE verifier) for the principal it names.

use std::sync::Arc;

use chrono::Duration;

use crate::application::authenticate::AuthenticateProcess;
use crate::application::config::AuthnConfig;
use crate::application::sign_up::SignupProcess;
use crate::domain::entity::{
    authorization_code::{AuthorizationCode, CodeAction},
    principal::{Principal, PrincipalInfo},
    task::Task,
};
use crate::domain::repository::AuthnStore;
use crate::domain::services::{HookDispatcher, TimeProvider};
use crate::domain::sso::{LinkState, LoginState, SsoAuthInfo};
use crate::domain::value_object::{
    session_step::SessionCreateReason, validation::ValidationCause,
};
use crate::error::{AuthnError, AuthnResult};

/// A stored authorization code and its plaintext, handed to the client once.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub record: AuthorizationCode,
    pub tasks: Vec<Task>,
}

/// Result of a successful code exchange
#[derive(Debug, Clone)]
pub struct ExchangedCode {
    pub record: AuthorizationCode,
    pub principal: Principal,
}

struct FederatedLogin {
    principal: Principal,
    reason: SessionCreateReason,
    tasks: Vec<Task>,
}

pub struct OAuthCoordinator<S, H>
where
    S: AuthnStore,
    H: HookDispatcher + Send + Sync + 'static,
{
    store: Arc<S>,
    authenticate: Arc<AuthenticateProcess<S>>,
    signup: Arc<SignupProcess<S, H>>,
    time: Arc<dyn TimeProvider>,
    config: Arc<AuthnConfig>,
}

impl<S, H> OAuthCoordinator<S, H>
where
    S: AuthnStore,
    H: HookDispatcher + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        authenticate: Arc<AuthenticateProcess<S>>,
        signup: Arc<SignupProcess<S, H>>,
        time: Arc<dyn TimeProvider>,
        config: Arc<AuthnConfig>,
    ) -> Self {
        Self {
            store,
            authenticate,
            signup,
            time,
            config,
        }
    }

    /// Log in (or sign up) with a federated identity and issue a `login` code.
    pub async fn authenticate_code(
        &self,
        info: &SsoAuthInfo,
        code_challenge: Option<String>,
        login_state: LoginState,
    ) -> AuthnResult<IssuedCode> {
        if !self
            .config
            .is_on_user_duplicate_allowed(login_state.on_user_duplicate)
        {
            return Err(AuthnError::validation_failed(vec![
                ValidationCause::not_allowed("/on_user_duplicate"),
            ]));
        }

        let login = self.authenticate_federated(info, login_state).await?;
        let (code, record) = self
            .issue_code(CodeAction::Login, code_challenge, &login.principal, Some(login.reason))
            .await?;

        tracing::info!(
            user_id = %record.user_id,
            principal_id = %record.principal_id,
            reason = ?login.reason,
            "Issued OAuth login code"
        );
        Ok(IssuedCode {
            code,
            record,
            tasks: login.tasks,
        })
    }

    /// Link a federated identity to `link_state.user_id` and issue a `link` code.
    pub async fn link_code(
        &self,
        info: &SsoAuthInfo,
        code_challenge: Option<String>,
        link_state: LinkState,
    ) -> AuthnResult<IssuedCode> {
        let principal = self
            .signup
            .link_with_oauth(info, &link_state.user_id)
            .await?;
        let (code, record) = self
            .issue_code(CodeAction::Link, code_challenge, &principal, None)
            .await?;

        Ok(IssuedCode {
            code,
            record,
            tasks: Vec::new(),
        })
    }

    /// Fetch and delete the code. Missing and expired codes are both `NotFound`.
    pub async fn consume_code(&self, code_hash: &str) -> AuthnResult<AuthorizationCode> {
        let record = self.store.consume_code(code_hash).await?;
        if record.is_expired(self.time.now_utc()) {
            tracing::debug!(user_id = %record.user_id, "Expired authorization code presented");
            return Err(AuthnError::NotFound);
        }
        Ok(record)
    }

    /// Exchange a plaintext code for its principal. The code is spent even if
    /// the verifier does not match.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> AuthnResult<ExchangedCode> {
        let record = self
            .consume_code(&platform::crypto::hash_token(code))
            .await?;

        if let Some(challenge) = &record.code_challenge {
            let verifier = code_verifier.unwrap_or_default();
            if !platform::crypto::verify_pkce_s256(verifier, challenge) {
                tracing::warn!(user_id = %record.user_id, "PKCE verifier mismatch");
                return Err(AuthnError::InvalidCredentials);
            }
        }

        let principal = self
            .authenticate
            .authenticate_as_principal(&record.principal_id)
            .await?;
        Ok(ExchangedCode { record, principal })
    }

    /// Existing principal, else signup, else merge into the one matching user.
    async fn authenticate_federated(
        &self,
        info: &SsoAuthInfo,
        login_state: LoginState,
    ) -> AuthnResult<FederatedLogin> {
        match self.authenticate.authenticate_with_oauth(info).await {
            Ok(principal) => {
                return Ok(FederatedLogin {
                    principal,
                    reason: SessionCreateReason::Login,
                    tasks: Vec::new(),
                });
            }
            Err(AuthnError::NotFound) => {}
            Err(e) => return Err(e),
        }

        match self
            .signup
            .signup_with_oauth(info, login_state.on_user_duplicate)
            .await
        {
            Ok(output) => {
                let principal = output
                    .principals
                    .into_iter()
                    .next()
                    .ok_or_else(|| AuthnError::Internal("signup created no principal".into()))?;
                Ok(FederatedLogin {
                    principal,
                    reason: SessionCreateReason::Signup,
                    tasks: output.tasks,
                })
            }
            Err(AuthnError::MergeRequired { user_id }) => {
                let principal = self.signup.link_with_oauth(info, &user_id).await?;
                tracing::info!(user_id = %user_id, "Merged federated login into existing user");
                Ok(FederatedLogin {
                    principal,
                    reason: SessionCreateReason::Login,
                    tasks: Vec::new(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn issue_code(
        &self,
        action: CodeAction,
        code_challenge: Option<String>,
        principal: &Principal,
        reason: Option<SessionCreateReason>,
    ) -> AuthnResult<(String, AuthorizationCode)> {
        let ttl = Duration::milliseconds(self.config.authorization_code_ttl_ms());
        let (record, code) = AuthorizationCode::issue(
            action,
            code_challenge,
            principal.principal_user_id(),
            principal.principal_id(),
            reason,
            self.time.now_utc(),
            ttl,
        );
        self.store.create_code(&record).await?;
        Ok((code, record))
    }
}
