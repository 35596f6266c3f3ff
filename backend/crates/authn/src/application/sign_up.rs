//! Signup Process
//!
//! Creates users from login IDs or from a federated login, and links federated
//! logins to existing users.
//!
//! Order within [`SignupProcess::create_user_with_login_ids`]:
//! 1. Validate the request (every cause is collected)
//! 2. Check the password policy
//! 3. Look for principals already claiming the same email
//! 4. Persist the account, the profile and the password principals
//! 5. Dispatch `user.create`; a rejection rolls back step 4
//! 6. Build background tasks

use std::collections::HashSet;
use std::sync::Arc;

use platform::password::ClearTextPassword;
use serde_json::{Map, Value};

use crate::application::config::{AuthnConfig, WelcomeEmailDestination};
use crate::application::hooks::dispatch_event;
use crate::application::identity_provider::IdentityProviderAggregator;
use crate::domain::entity::{
    event::AuthEvent,
    oauth_principal::OAuthPrincipal,
    password_principal::PasswordPrincipal,
    principal::{Principal, PrincipalInfo},
    task::Task,
    user::{User, UserAccount, UserProfile},
};
use crate::domain::repository::AuthnStore;
use crate::domain::services::{HookDispatcher, LoginIdChecker, PasswordChecker, TimeProvider};
use crate::domain::sso::SsoAuthInfo;
use crate::domain::value_object::{
    claims::StandardKey,
    ids::{PrincipalId, UserId},
    login_id::LoginId,
    on_user_duplicate::OnUserDuplicate,
    validation::ValidationCause,
};
use crate::error::{AuthnError, AuthnResult};

/// A freshly created user, its principals, and the tasks to enqueue once the
/// caller has committed to the result.
#[derive(Debug, Clone)]
pub struct SignupOutput {
    pub user: User,
    pub principals: Vec<Principal>,
    pub tasks: Vec<Task>,
}

/// Rows written so far, removed again if a later step fails
#[derive(Default)]
struct CreatedRows {
    user_id: Option<UserId>,
    profile: bool,
    password_principals: Vec<PrincipalId>,
    oauth_principal: Option<PrincipalId>,
}

pub struct SignupProcess<S, H>
where
    S: AuthnStore,
    H: HookDispatcher + Send + Sync + 'static,
{
    store: Arc<S>,
    identity_provider: IdentityProviderAggregator,
    login_id_checker: Arc<dyn LoginIdChecker>,
    password_checker: Arc<dyn PasswordChecker>,
    hooks: Arc<H>,
    time: Arc<dyn TimeProvider>,
    config: Arc<AuthnConfig>,
}

impl<S, H> SignupProcess<S, H>
where
    S: AuthnStore,
    H: HookDispatcher + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        identity_provider: IdentityProviderAggregator,
        login_id_checker: Arc<dyn LoginIdChecker>,
        password_checker: Arc<dyn PasswordChecker>,
        hooks: Arc<H>,
        time: Arc<dyn TimeProvider>,
        config: Arc<AuthnConfig>,
    ) -> Self {
        Self {
            store,
            identity_provider,
            login_id_checker,
            password_checker,
            hooks,
            time,
            config,
        }
    }

    /// Validate a single login ID as a signup would, with `abort` on duplicates.
    pub fn validate_signup_login_id(&self, login_id: &LoginId) -> AuthnResult<()> {
        let login_id = self.login_id_checker.normalize(login_id);
        self.validate_login_ids(std::slice::from_ref(&login_id), OnUserDuplicate::Abort)
    }

    pub async fn create_user_with_login_ids(
        &self,
        login_ids: &[LoginId],
        password: &str,
        metadata: Map<String, Value>,
        on_user_duplicate: OnUserDuplicate,
    ) -> AuthnResult<SignupOutput> {
        let login_ids: Vec<LoginId> = login_ids
            .iter()
            .map(|l| self.login_id_checker.normalize(l))
            .collect();
        self.validate_login_ids(&login_ids, on_user_duplicate)?;

        let password = ClearTextPassword::new(password);
        self.password_checker.validate_password(&password)?;

        let mut existing = Vec::new();
        for login_id in self.email_login_ids(&login_ids) {
            existing.extend(self.find_principals_claiming_email(&login_id.value).await?);
        }
        if !existing.is_empty() {
            if on_user_duplicate == OnUserDuplicate::Abort {
                return Err(AuthnError::LoginIdAlreadyUsed);
            }
            tracing::info!(
                existing_principals = existing.len(),
                "Creating user although the email is already claimed"
            );
        }

        let now = self.time.now_utc();
        let hashed = password.hash_with(self.config.password_hash_params, self.config.pepper())?;
        let account = UserAccount::new(now);
        let profile = UserProfile::new(account.id, metadata, now);
        let password_principals: Vec<PasswordPrincipal> = login_ids
            .iter()
            .map(|login_id| {
                PasswordPrincipal::new(
                    account.id,
                    login_id,
                    self.config.default_realm.clone(),
                    hashed.clone(),
                    self.login_id_checker.standard_key(&login_id.key),
                    now,
                )
            })
            .collect();

        let mut rows = CreatedRows::default();
        if let Err(e) = self
            .insert_password_user(&account, &profile, &password_principals, &mut rows)
            .await
        {
            self.rollback(rows).await;
            return Err(match e {
                AuthnError::AlreadyExists => AuthnError::LoginIdAlreadyUsed,
                e => e,
            });
        }

        let principals: Vec<Principal> = password_principals.into_iter().map(Principal::from).collect();
        let mut user = User::new(account, profile);
        let event = AuthEvent::UserCreate {
            identities: principals.iter().map(Principal::to_identity).collect(),
        };
        if let Err(e) = dispatch_event(self.store.as_ref(), self.hooks.as_ref(), &event, &mut user).await
        {
            self.rollback(rows).await;
            return Err(e);
        }

        let tasks = self.login_id_signup_tasks(user.id(), &login_ids);
        tracing::info!(
            user_id = %user.id(),
            principals = principals.len(),
            "User signed up with login IDs"
        );
        Ok(SignupOutput {
            user,
            principals,
            tasks,
        })
    }

    /// Create a user for a federated login that matched no principal.
    ///
    /// Fails with `MergeRequired` when exactly one user already owns the
    /// federated email and the caller asked to merge; nothing is written then.
    pub async fn signup_with_oauth(
        &self,
        info: &SsoAuthInfo,
        on_user_duplicate: OnUserDuplicate,
    ) -> AuthnResult<SignupOutput> {
        let existing = match info.email() {
            Some(email) => self.find_principals_claiming_email(email).await?,
            None => Vec::new(),
        };
        let user_ids = distinct_user_ids(&existing);

        match (user_ids.as_slice(), on_user_duplicate) {
            ([], _) => {}
            ([_, _, ..], _) => return Err(AuthnError::LoginIdAlreadyUsed),
            ([_], OnUserDuplicate::Abort) => return Err(AuthnError::LoginIdAlreadyUsed),
            ([user_id], OnUserDuplicate::Merge) => {
                return Err(AuthnError::MergeRequired { user_id: *user_id });
            }
            ([user_id], OnUserDuplicate::Create) => {
                tracing::info!(
                    existing_user_id = %user_id,
                    provider = %info.provider_config.provider_type,
                    "Creating separate user for federated login"
                );
            }
        }

        let now = self.time.now_utc();
        let account = UserAccount::new(now);
        let profile = UserProfile::new(account.id, Map::new(), now);
        let oauth_principal = OAuthPrincipal::new(account.id, info, now);

        let mut rows = CreatedRows::default();
        if let Err(e) = self
            .insert_oauth_user(&account, &profile, &oauth_principal, &mut rows)
            .await
        {
            self.rollback(rows).await;
            return Err(match e {
                AuthnError::AlreadyExists => AuthnError::LoginIdAlreadyUsed,
                e => e,
            });
        }

        let principal = Principal::from(oauth_principal);
        let mut user = User::new(account, profile);
        let event = AuthEvent::UserCreate {
            identities: vec![principal.to_identity()],
        };
        if let Err(e) = dispatch_event(self.store.as_ref(), self.hooks.as_ref(), &event, &mut user).await
        {
            self.rollback(rows).await;
            return Err(e);
        }

        let mut tasks = Vec::new();
        if let Some(email) = info.email().filter(|_| self.config.welcome_email.enabled) {
            tasks.push(Task::WelcomeEmail {
                user_id: user.id(),
                email: email.to_string(),
            });
        }

        tracing::info!(
            user_id = %user.id(),
            provider = %info.provider_config.provider_type,
            "User signed up with OAuth"
        );
        Ok(SignupOutput {
            user,
            principals: vec![principal],
            tasks,
        })
    }

    /// Bind a federated login to an existing user.
    pub async fn link_with_oauth(&self, info: &SsoAuthInfo, user_id: &UserId) -> AuthnResult<Principal> {
        match self
            .store
            .get_oauth_principal_by_provider(
                &info.provider_config.provider_type.to_string(),
                &info.provider_config.provider_keys(),
                &info.provider_user_info.id,
            )
            .await
        {
            Ok(_) => return Err(AuthnError::AlreadyLinked),
            Err(AuthnError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let account = self.store.get_user(user_id).await?;
        let profile = self.store.get_profile(user_id).await?;
        let mut user = User::new(account, profile);

        let oauth_principal = OAuthPrincipal::new(*user_id, info, self.time.now_utc());
        self.store
            .create_oauth_principal(&oauth_principal)
            .await
            .map_err(|e| match e {
                AuthnError::AlreadyExists => AuthnError::AlreadyLinked,
                e => e,
            })?;

        let principal = Principal::from(oauth_principal);
        let event = AuthEvent::IdentityCreate {
            identity: principal.to_identity(),
        };
        if let Err(e) = dispatch_event(self.store.as_ref(), self.hooks.as_ref(), &event, &mut user).await
        {
            self.rollback(CreatedRows {
                oauth_principal: Some(principal.principal_id()),
                ..Default::default()
            })
            .await;
            return Err(e);
        }

        tracing::info!(
            user_id = %user_id,
            principal_id = %principal.principal_id(),
            provider = %info.provider_config.provider_type,
            "Linked OAuth principal"
        );
        Ok(principal)
    }

    fn validate_login_ids(
        &self,
        login_ids: &[LoginId],
        on_user_duplicate: OnUserDuplicate,
    ) -> AuthnResult<()> {
        let mut causes = Vec::new();

        // Merge needs a federated identity to merge into
        if !on_user_duplicate.is_allowed(false, self.config.on_user_duplicate_allow_create) {
            causes.push(ValidationCause::not_allowed("/on_user_duplicate"));
        }

        let mut seen = HashSet::new();
        for (i, login_id) in login_ids.iter().enumerate() {
            if !seen.insert(login_id.value.as_str()) {
                causes.push(ValidationCause::duplicated(format!("/login_ids/{}/value", i)));
            }
        }

        causes.extend(
            self.login_id_checker
                .validate(login_ids)
                .into_iter()
                .map(|cause| cause.prefixed("/login_ids")),
        );

        if causes.is_empty() {
            Ok(())
        } else {
            Err(AuthnError::validation_failed(causes))
        }
    }

    fn email_login_ids<'a>(&self, login_ids: &'a [LoginId]) -> impl Iterator<Item = &'a LoginId> {
        let checker = self.login_id_checker.clone();
        login_ids
            .iter()
            .filter(move |l| checker.check_type(&l.key, StandardKey::Email))
    }

    /// Principals claiming `email`, skipping password principals of other realms.
    async fn find_principals_claiming_email(&self, email: &str) -> AuthnResult<Vec<Principal>> {
        if email.is_empty() {
            return Ok(Vec::new());
        }
        let principals = self
            .identity_provider
            .list_principals_by_claim(StandardKey::Email.claim_name(), email)
            .await?;
        Ok(principals
            .into_iter()
            .filter(|p| match p.as_password() {
                Some(password) => password.realm == self.config.default_realm,
                None => true,
            })
            .collect())
    }

    fn login_id_signup_tasks(&self, user_id: UserId, login_ids: &[LoginId]) -> Vec<Task> {
        let mut tasks = Vec::new();

        if self.config.welcome_email.enabled {
            let emails = self.email_login_ids(login_ids);
            let destinations: Vec<&LoginId> = match self.config.welcome_email.destination {
                WelcomeEmailDestination::First => emails.take(1).collect(),
                WelcomeEmailDestination::All => emails.collect(),
            };
            tasks.extend(destinations.into_iter().map(|login_id| Task::WelcomeEmail {
                user_id,
                email: login_id.value.clone(),
            }));
        }

        let verification = &self.config.user_verification;
        if verification.auto_send_on_signup {
            tasks.extend(
                login_ids
                    .iter()
                    .filter(|l| verification.login_id_keys.contains(&l.key))
                    .map(|login_id| Task::VerifyCode {
                        user_id,
                        login_id: login_id.clone(),
                    }),
            );
        }

        tasks
    }

    async fn insert_password_user(
        &self,
        account: &UserAccount,
        profile: &UserProfile,
        principals: &[PasswordPrincipal],
        rows: &mut CreatedRows,
    ) -> AuthnResult<()> {
        self.insert_user(account, profile, rows).await?;
        self.store.create_password_principals(principals).await?;
        rows.password_principals = principals.iter().map(|p| p.id).collect();
        Ok(())
    }

    async fn insert_oauth_user(
        &self,
        account: &UserAccount,
        profile: &UserProfile,
        principal: &OAuthPrincipal,
        rows: &mut CreatedRows,
    ) -> AuthnResult<()> {
        self.insert_user(account, profile, rows).await?;
        self.store.create_oauth_principal(principal).await?;
        rows.oauth_principal = Some(principal.id);
        Ok(())
    }

    async fn insert_user(
        &self,
        account: &UserAccount,
        profile: &UserProfile,
        rows: &mut CreatedRows,
    ) -> AuthnResult<()> {
        self.store.create_user(account).await?;
        rows.user_id = Some(account.id);
        self.store.create_profile(profile).await?;
        rows.profile = true;
        Ok(())
    }

    /// Best effort; failures are logged and the original error is kept.
    async fn rollback(&self, rows: CreatedRows) {
        for id in &rows.password_principals {
            if let Err(e) = self.store.delete_password_principal(id).await {
                tracing::error!(principal_id = %id, error = %e, "Rollback failed");
            }
        }
        if let Some(id) = &rows.oauth_principal {
            if let Err(e) = self.store.delete_oauth_principal(id).await {
                tracing::error!(principal_id = %id, error = %e, "Rollback failed");
            }
        }
        if let Some(user_id) = &rows.user_id {
            if rows.profile {
                if let Err(e) = self.store.delete_profile(user_id).await {
                    tracing::error!(user_id = %user_id, error = %e, "Rollback failed");
                }
            }
            if let Err(e) = self.store.delete_user(user_id).await {
                tracing::error!(user_id = %user_id, error = %e, "Rollback failed");
            }
        }
    }
}

/// Owners of `principals`, first occurrence order
fn distinct_user_ids(principals: &[Principal]) -> Vec<UserId> {
    let mut seen = HashSet::new();
    principals
        .iter()
        .map(PrincipalInfo::principal_user_id)
        .filter(|id| seen.insert(*id))
        .collect()
}
