//! Session Provider
//!
//! Drives an [`AuthnSession`] from the identity step through any MFA step to a
//! persisted [`Session`]. Between steps the pending session travels as a
//! signed token; nothing is stored until the last step is finished.

use std::sync::Arc;

use chrono::Duration;

use crate::application::config::{AuthnConfig, MfaEnforcement};
use crate::application::hooks::dispatch_event;
use crate::application::identity_provider::IdentityProviderAggregator;
use crate::application::result::{CompletionResult, InProgressResult, StepResult};
use crate::application::session_token::AuthnSessionTokenCodec;
use crate::domain::entity::{
    authn_session::AuthnSession,
    event::AuthEvent,
    principal::{Principal, PrincipalInfo},
    session::Session,
    user::User,
};
use crate::domain::repository::AuthnStore;
use crate::domain::services::{HookDispatcher, TimeProvider};
use crate::domain::value_object::{
    ids::UserId,
    session_step::{SessionCreateReason, SessionStep},
};
use crate::error::{AuthnError, AuthnResult};

/// How [`SessionProvider::resolve_user_id`] treats a session waiting on MFA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaCase {
    AlwaysAccept,
    /// Accept only while the user has no authenticator (enrollment)
    OnlyWhenNoAuthenticators,
}

pub struct SessionProvider<S, H>
where
    S: AuthnStore,
    H: HookDispatcher + Send + Sync + 'static,
{
    store: Arc<S>,
    identity_provider: IdentityProviderAggregator,
    hooks: Arc<H>,
    codec: AuthnSessionTokenCodec,
    time: Arc<dyn TimeProvider>,
    config: Arc<AuthnConfig>,
}

impl<S, H> SessionProvider<S, H>
where
    S: AuthnStore,
    H: HookDispatcher + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        identity_provider: IdentityProviderAggregator,
        hooks: Arc<H>,
        time: Arc<dyn TimeProvider>,
        config: Arc<AuthnConfig>,
    ) -> Self {
        Self {
            store,
            identity_provider,
            hooks,
            codec: AuthnSessionTokenCodec::new(config.authn_session_secret),
            time,
            config,
        }
    }

    /// Start a session for an authenticated principal. The identity step is
    /// finished; an MFA step is added per the tenant's enforcement.
    pub async fn begin_session(
        &self,
        client_id: &str,
        user_id: &UserId,
        principal: &Principal,
        reason: SessionCreateReason,
    ) -> AuthnResult<AuthnSession> {
        if principal.principal_user_id() != *user_id {
            tracing::error!(
                user_id = %user_id,
                principal_id = %principal.principal_id(),
                "Principal does not belong to the session user"
            );
            return Err(AuthnError::Fatal("principal belongs to another user".into()));
        }
        let mfa_step = self.mfa_step(user_id).await?;
        Ok(AuthnSession::new(client_id, principal, mfa_step, reason))
    }

    async fn mfa_step(&self, user_id: &UserId) -> AuthnResult<Option<SessionStep>> {
        if self.config.mfa_enforcement == MfaEnforcement::Off {
            return Ok(None);
        }
        let enrolled = !self.store.list_authenticators(user_id).await?.is_empty();

        Ok(match self.config.mfa_enforcement {
            MfaEnforcement::Off => None,
            MfaEnforcement::Optional => enrolled.then_some(SessionStep::MfaAuthn),
            MfaEnforcement::Required if enrolled => Some(SessionStep::MfaAuthn),
            MfaEnforcement::Required => Some(SessionStep::MfaSetup),
        })
    }

    /// Complete a finished session, or sign a pending one into a token.
    pub async fn step_session(&self, authn_session: &AuthnSession) -> AuthnResult<StepResult> {
        match authn_session.next_step() {
            None => Ok(StepResult::Completed(Box::new(
                self.complete(authn_session).await?,
            ))),
            Some(step) => {
                let ttl = Duration::milliseconds(self.config.authn_session_ttl_ms());
                let token = self
                    .codec
                    .encode(authn_session, self.time.now_utc(), ttl)?;
                tracing::debug!(
                    user_id = %authn_session.user_id(),
                    step = %step,
                    "Authentication session needs another step"
                );
                Ok(StepResult::InProgress(InProgressResult { token, step }))
            }
        }
    }

    async fn complete(&self, authn_session: &AuthnSession) -> AuthnResult<CompletionResult> {
        let user_id = authn_session.user_id();
        let account = self.store.get_user(&user_id).await?;
        let profile = self.store.get_profile(&user_id).await?;
        let mut user = User::new(account, profile);

        let principal = self
            .identity_provider
            .get_principal_by_id(&authn_session.principal_id())
            .await?;
        if principal.principal_user_id() != user_id {
            return Err(AuthnError::InvalidAuthenticationSession);
        }

        let now = self.time.now_utc();
        let (session, access_token) = Session::new(
            authn_session.client_id(),
            user_id,
            principal.principal_id(),
            authn_session.session_create_reason(),
            now,
        );

        let identity = principal.to_identity();
        let event = AuthEvent::SessionCreate {
            identity: identity.clone(),
            session_id: session.id,
            reason: authn_session.session_create_reason(),
        };
        dispatch_event(self.store.as_ref(), self.hooks.as_ref(), &event, &mut user).await?;

        // last_login_at only moves once the session exists
        self.store.create_session(&session).await?;
        user.account.record_login(now);
        self.store.update_user(&user.account).await?;

        tracing::info!(
            user_id = %user_id,
            session_id = %session.id,
            client_id = %session.client_id,
            reason = %session.create_reason,
            "Session created"
        );
        Ok(CompletionResult {
            user,
            principal,
            identity,
            session,
            access_token,
            authenticator_bearer_token: authn_session
                .authenticator_bearer_token()
                .map(str::to_string),
        })
    }

    /// Decode a continuation token. Every failure is `InvalidAuthenticationSession`.
    pub fn resolve_session(&self, token: &str) -> AuthnResult<AuthnSession> {
        self.codec.decode(token, self.time.now_utc())
    }

    /// Wrap an existing session and its access token into a completion result.
    pub async fn make_result(
        &self,
        client_id: &str,
        session: Session,
        access_token: String,
        authenticator_bearer_token: Option<String>,
    ) -> AuthnResult<CompletionResult> {
        if session.client_id != client_id {
            return Err(AuthnError::InvalidAuthenticationSession);
        }
        if !session.matches_access_token(&access_token) {
            return Err(AuthnError::InvalidCredentials);
        }

        let account = self.store.get_user(&session.user_id).await?;
        let profile = self.store.get_profile(&session.user_id).await?;
        let principal = self
            .identity_provider
            .get_principal_by_id(&session.principal_id)
            .await?;
        let identity = principal.to_identity();

        Ok(CompletionResult {
            user: User::new(account, profile),
            principal,
            identity,
            session,
            access_token,
            authenticator_bearer_token,
        })
    }

    /// User of a pending session that is waiting on an MFA step.
    pub async fn resolve_user_id(&self, token: &str, mfa_case: MfaCase) -> AuthnResult<UserId> {
        let authn_session = self.resolve_session(token)?;
        let user_id = authn_session.user_id();

        match authn_session.next_step() {
            Some(step) if step.is_mfa() => match mfa_case {
                MfaCase::AlwaysAccept => Ok(user_id),
                MfaCase::OnlyWhenNoAuthenticators => {
                    if self.store.list_authenticators(&user_id).await?.is_empty() {
                        Ok(user_id)
                    } else {
                        Err(AuthnError::InvalidAuthenticationSession)
                    }
                }
            },
            _ => Err(AuthnError::InvalidAuthenticationSession),
        }
    }
}
