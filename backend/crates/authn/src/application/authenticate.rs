//! Authenticate Process
//!
//! Verifies a credential and returns the principal it belongs to.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthnConfig;
use crate::application::identity_provider::IdentityProviderAggregator;
use crate::domain::entity::{password_principal::PasswordPrincipal, principal::Principal};
use crate::domain::repository::AuthnStore;
use crate::domain::services::{LoginIdChecker, TimeProvider, exactly_one};
use crate::domain::sso::SsoAuthInfo;
use crate::domain::value_object::{ids::PrincipalId, login_id::LoginId};
use crate::error::{AuthnError, AuthnResult};

pub struct AuthenticateProcess<S>
where
    S: AuthnStore,
{
    store: Arc<S>,
    identity_provider: IdentityProviderAggregator,
    login_id_checker: Arc<dyn LoginIdChecker>,
    time: Arc<dyn TimeProvider>,
    config: Arc<AuthnConfig>,
}

impl<S> AuthenticateProcess<S>
where
    S: AuthnStore,
{
    pub fn new(
        store: Arc<S>,
        identity_provider: IdentityProviderAggregator,
        login_id_checker: Arc<dyn LoginIdChecker>,
        time: Arc<dyn TimeProvider>,
        config: Arc<AuthnConfig>,
    ) -> Self {
        Self {
            store,
            identity_provider,
            login_id_checker,
            time,
            config,
        }
    }

    /// Password login within the default realm.
    ///
    /// Unknown login ID, ambiguous login ID and wrong password are all
    /// `InvalidCredentials`.
    pub async fn authenticate_with_login_id(
        &self,
        login_id: &LoginId,
        password: &str,
    ) -> AuthnResult<Principal> {
        let mut candidates: Vec<PasswordPrincipal> = Vec::new();
        for lookup in self.login_id_checker.lookup_candidates(login_id) {
            for principal in self
                .store
                .list_password_principals_by_login_id(&lookup, &self.config.default_realm)
                .await?
            {
                if !candidates.iter().any(|c| c.id == principal.id) {
                    candidates.push(principal);
                }
            }
        }

        let principal = match exactly_one(candidates) {
            Ok(principal) => principal,
            Err(AuthnError::NotFound) => return Err(AuthnError::InvalidCredentials),
            Err(AuthnError::MultipleResultsFound) => {
                tracing::warn!(
                    login_id_key = %login_id.key,
                    realm = %self.config.default_realm,
                    "Multiple password principals share a login ID"
                );
                return Err(AuthnError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let password = ClearTextPassword::new(password);
        if !principal.verify_password(&password, self.config.pepper()) {
            return Err(AuthnError::InvalidCredentials);
        }

        let principal = if principal.needs_rehash(&self.config.password_hash_params) {
            match self.migrate_password(&principal, &password).await {
                Ok(migrated) => migrated,
                Err(e) => {
                    tracing::error!(
                        principal_id = %principal.id,
                        error = %e,
                        "Failed to migrate password hash"
                    );
                    principal
                }
            }
        } else {
            principal
        };

        tracing::info!(
            principal_id = %principal.id,
            user_id = %principal.user_id,
            "Authenticated with login ID"
        );
        Ok(principal.into())
    }

    async fn migrate_password(
        &self,
        principal: &PasswordPrincipal,
        password: &ClearTextPassword,
    ) -> AuthnResult<PasswordPrincipal> {
        let hashed = password.hash_with(self.config.password_hash_params, self.config.pepper())?;
        let mut migrated = principal.clone();
        migrated.set_password(hashed, self.time.now_utc());
        self.store.update_password_principal(&migrated).await?;
        tracing::info!(principal_id = %migrated.id, "Password hash migrated");
        Ok(migrated)
    }

    /// Federated login. Refreshes the stored token response, profile and
    /// claims. `NotFound` when no principal exists for the subject.
    pub async fn authenticate_with_oauth(&self, info: &SsoAuthInfo) -> AuthnResult<Principal> {
        let mut principal = self
            .store
            .get_oauth_principal_by_provider(
                &info.provider_config.provider_type.to_string(),
                &info.provider_config.provider_keys(),
                &info.provider_user_info.id,
            )
            .await?;

        principal.refresh(info, self.time.now_utc());
        self.store.update_oauth_principal(&principal).await?;

        tracing::info!(
            principal_id = %principal.id,
            provider = %principal.provider_type,
            "Authenticated with OAuth"
        );
        Ok(principal.into())
    }

    pub async fn authenticate_as_principal(&self, principal_id: &PrincipalId) -> AuthnResult<Principal> {
        self.identity_provider.get_principal_by_id(principal_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::principal::PrincipalInfo;
    use crate::domain::repository::PasswordPrincipalRepository;
    use crate::domain::value_object::ids::UserId;
    use crate::infra::memory::InMemoryStore;
    use crate::test_support::{
        FixedClock, TestEnv, google_info, seed_oauth_principal, seed_password_principal,
    };
    use platform::password::HashParams;

    fn process(env: &TestEnv) -> AuthenticateProcess<InMemoryStore> {
        env.authenticate_process()
    }

    #[tokio::test]
    async fn test_unknown_login_id_is_invalid_credentials() {
        let env = TestEnv::new();
        let result = process(&env)
            .authenticate_with_login_id(&LoginId::new("email", "nobody@example.com"), "whatever-pw")
            .await;
        assert!(matches!(result, Err(AuthnError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let env = TestEnv::new();
        seed_password_principal(&env.store, UserId::new(), "email", "a@example.com", "default")
            .await;
        let result = process(&env)
            .authenticate_with_login_id(&LoginId::new("email", "a@example.com"), "not-the-pw")
            .await;
        assert!(matches!(result, Err(AuthnError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_correct_password_with_any_key() {
        let env = TestEnv::new();
        let seeded =
            seed_password_principal(&env.store, UserId::new(), "email", "a@example.com", "default")
                .await;
        let principal = process(&env)
            .authenticate_with_login_id(&LoginId::any_key("a@example.com"), crate::test_support::PASSWORD)
            .await
            .unwrap();
        assert_eq!(principal.principal_id(), seeded.id);
    }

    #[tokio::test]
    async fn test_any_key_login_id_is_normalized_per_key() {
        let env = TestEnv::new();
        let by_email =
            seed_password_principal(&env.store, UserId::new(), "email", "a@example.com", "default")
                .await;
        let by_username =
            seed_password_principal(&env.store, UserId::new(), "username", "alice", "default")
                .await;

        let principal = process(&env)
            .authenticate_with_login_id(&LoginId::any_key(" A@Example.com "), crate::test_support::PASSWORD)
            .await
            .unwrap();
        assert_eq!(principal.principal_id(), by_email.id);

        let principal = process(&env)
            .authenticate_with_login_id(&LoginId::any_key("ALICE"), crate::test_support::PASSWORD)
            .await
            .unwrap();
        assert_eq!(principal.principal_id(), by_username.id);
    }

    #[tokio::test]
    async fn test_other_realm_is_not_matched() {
        let env = TestEnv::new();
        seed_password_principal(&env.store, UserId::new(), "email", "a@example.com", "admin").await;
        let result = process(&env)
            .authenticate_with_login_id(&LoginId::new("email", "a@example.com"), crate::test_support::PASSWORD)
            .await;
        assert!(matches!(result, Err(AuthnError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_ambiguous_login_id_is_invalid_credentials() {
        let env = TestEnv::new();
        seed_password_principal(&env.store, UserId::new(), "email", "dup@example.com", "default")
            .await;
        seed_password_principal(&env.store, UserId::new(), "username", "dup@example.com", "default")
            .await;

        let lookup = env
            .store
            .list_password_principals_by_login_id(&LoginId::any_key("dup@example.com"), "default")
            .await
            .unwrap();
        assert!(matches!(exactly_one(lookup), Err(AuthnError::MultipleResultsFound)));

        let result = process(&env)
            .authenticate_with_login_id(&LoginId::any_key("dup@example.com"), crate::test_support::PASSWORD)
            .await;
        assert!(matches!(result, Err(AuthnError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_outdated_hash_is_migrated() {
        let mut env = TestEnv::new();
        let seeded =
            seed_password_principal(&env.store, UserId::new(), "email", "a@example.com", "default")
                .await;
        // Seeded with insecure_fast; raise the configured cost.
        env.set_config(|c| {
            c.password_hash_params = HashParams {
                t_cost: 2,
                ..HashParams::insecure_fast()
            }
        });

        process(&env)
            .authenticate_with_login_id(&LoginId::new("email", "a@example.com"), crate::test_support::PASSWORD)
            .await
            .unwrap();

        let stored = env.store.get_password_principal(&seeded.id).await.unwrap();
        assert_ne!(stored.hashed_password, seeded.hashed_password);
        assert!(!stored.needs_rehash(&env.config.password_hash_params));
        assert_eq!(stored.updated_at, FixedClock::default().now_utc());
    }

    #[tokio::test]
    async fn test_oauth_refreshes_profile() {
        let env = TestEnv::new();
        let seeded = seed_oauth_principal(&env.store, UserId::new(), "sub-1", Some("old@example.com")).await;

        let principal = process(&env)
            .authenticate_with_oauth(&google_info("sub-1", Some("new@example.com")))
            .await
            .unwrap();
        assert_eq!(principal.principal_id(), seeded.id);
        assert_eq!(
            principal.claims().get("email").map(String::as_str),
            Some("new@example.com")
        );
    }

    #[tokio::test]
    async fn test_oauth_unknown_subject_is_not_found() {
        let env = TestEnv::new();
        let result = process(&env)
            .authenticate_with_oauth(&google_info("sub-404", None))
            .await;
        assert!(matches!(result, Err(AuthnError::NotFound)));
    }
}
