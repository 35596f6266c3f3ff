//! In-Memory Repository Implementations
//!
//! Reference store behind every repository trait. All tables sit behind one
//! lock, so each call is atomic and uniqueness checks cannot race inserts.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::entity::{
    anonymous_principal::AnonymousPrincipal,
    authenticator::Authenticator,
    authorization_code::AuthorizationCode,
    custom_token_principal::CustomTokenPrincipal,
    oauth_principal::OAuthPrincipal,
    password_principal::PasswordPrincipal,
    session::Session,
    user::{UserAccount, UserProfile},
};
use crate::domain::repository::{
    AnonymousPrincipalRepository, AuthenticatorRepository, AuthorizationCodeRepository,
    CustomTokenPrincipalRepository, OAuthPrincipalRepository, PasswordPrincipalRepository,
    SessionRepository, UserProfileRepository, UserRepository,
};
use crate::domain::services::PrincipalTypeRegistry;
use crate::domain::sso::ProviderKeys;
use crate::domain::value_object::{
    claims::Claims,
    ids::{PrincipalId, SessionId, UserId},
    login_id::LoginId,
    provider_type::ProviderType,
};
use crate::error::{AuthnError, AuthnResult};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserAccount>,
    profiles: HashMap<UserId, UserProfile>,
    // Vecs keep insertion order for list queries
    password_principals: Vec<PasswordPrincipal>,
    oauth_principals: Vec<OAuthPrincipal>,
    anonymous_principals: Vec<AnonymousPrincipal>,
    custom_token_principals: Vec<CustomTokenPrincipal>,
    codes: HashMap<String, AuthorizationCode>,
    sessions: HashMap<SessionId, Session>,
    authenticators: Vec<Authenticator>,
}

/// In-memory store
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    #[cfg(test)]
    session_writes_down: std::sync::atomic::AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().users.len()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().sessions.len()
    }

    /// Make `create_session` fail with a store error until switched back.
    #[cfg(test)]
    pub fn set_session_writes_down(&self, down: bool) {
        self.session_writes_down
            .store(down, std::sync::atomic::Ordering::SeqCst);
    }
}

fn same_login_id(p: &PasswordPrincipal, other: &PasswordPrincipal) -> bool {
    p.login_id_key == other.login_id_key && p.login_id == other.login_id && p.realm == other.realm
}

fn same_provider(
    p: &OAuthPrincipal,
    provider_type: &str,
    provider_keys: &ProviderKeys,
    provider_user_id: &str,
) -> bool {
    p.provider_type == provider_type
        && &p.provider_keys == provider_keys
        && p.provider_user_id == provider_user_id
}

fn has_claim(claims: &Claims, name: &str, value: &str) -> bool {
    claims.get(name).is_some_and(|v| v == value)
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for InMemoryStore {
    async fn create_user(&self, account: &UserAccount) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        if tables.users.contains_key(&account.id) {
            return Err(AuthnError::AlreadyExists);
        }
        tables.users.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> AuthnResult<UserAccount> {
        self.tables
            .lock()
            .users
            .get(user_id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn update_user(&self, account: &UserAccount) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let stored = tables.users.get_mut(&account.id).ok_or(AuthnError::NotFound)?;
        *stored = account.clone();
        Ok(())
    }

    async fn delete_user(&self, user_id: &UserId) -> AuthnResult<()> {
        self.tables
            .lock()
            .users
            .remove(user_id)
            .map(|_| ())
            .ok_or(AuthnError::NotFound)
    }
}

// ============================================================================
// User Profile Repository Implementation
// ============================================================================

impl UserProfileRepository for InMemoryStore {
    async fn create_profile(&self, profile: &UserProfile) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        if tables.profiles.contains_key(&profile.user_id) {
            return Err(AuthnError::AlreadyExists);
        }
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> AuthnResult<UserProfile> {
        self.tables
            .lock()
            .profiles
            .get(user_id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn update_profile(&self, profile: &UserProfile) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let stored = tables
            .profiles
            .get_mut(&profile.user_id)
            .ok_or(AuthnError::NotFound)?;
        *stored = profile.clone();
        Ok(())
    }

    async fn delete_profile(&self, user_id: &UserId) -> AuthnResult<()> {
        self.tables
            .lock()
            .profiles
            .remove(user_id)
            .map(|_| ())
            .ok_or(AuthnError::NotFound)
    }
}

// ============================================================================
// Password Principal Repository Implementation
// ============================================================================

impl PasswordPrincipalRepository for InMemoryStore {
    async fn create_password_principals(&self, principals: &[PasswordPrincipal]) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        for (i, principal) in principals.iter().enumerate() {
            let clashes_stored = tables
                .password_principals
                .iter()
                .any(|p| p.id == principal.id || same_login_id(p, principal));
            let clashes_batch = principals[..i].iter().any(|p| same_login_id(p, principal));
            if clashes_stored || clashes_batch {
                return Err(AuthnError::AlreadyExists);
            }
        }
        tables.password_principals.extend(principals.iter().cloned());
        Ok(())
    }

    async fn get_password_principal(&self, id: &PrincipalId) -> AuthnResult<PasswordPrincipal> {
        self.tables
            .lock()
            .password_principals
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn list_password_principals_by_login_id(
        &self,
        login_id: &LoginId,
        realm: &str,
    ) -> AuthnResult<Vec<PasswordPrincipal>> {
        Ok(self
            .tables
            .lock()
            .password_principals
            .iter()
            .filter(|p| {
                login_id.matches_key(&p.login_id_key)
                    && p.login_id == login_id.value
                    && p.realm == realm
            })
            .cloned()
            .collect())
    }

    async fn list_password_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<PasswordPrincipal>> {
        Ok(self
            .tables
            .lock()
            .password_principals
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_password_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<PasswordPrincipal>> {
        Ok(self
            .tables
            .lock()
            .password_principals
            .iter()
            .filter(|p| has_claim(&p.claims, name, value))
            .cloned()
            .collect())
    }

    async fn update_password_principal(&self, principal: &PasswordPrincipal) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let stored = tables
            .password_principals
            .iter_mut()
            .find(|p| p.id == principal.id)
            .ok_or(AuthnError::NotFound)?;
        *stored = principal.clone();
        Ok(())
    }

    async fn delete_password_principal(&self, id: &PrincipalId) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let before = tables.password_principals.len();
        tables.password_principals.retain(|p| &p.id != id);
        if tables.password_principals.len() == before {
            return Err(AuthnError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// OAuth Principal Repository Implementation
// ============================================================================

impl OAuthPrincipalRepository for InMemoryStore {
    async fn create_oauth_principal(&self, principal: &OAuthPrincipal) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let exists = tables.oauth_principals.iter().any(|p| {
            p.id == principal.id
                || same_provider(
                    p,
                    &principal.provider_type,
                    &principal.provider_keys,
                    &principal.provider_user_id,
                )
        });
        if exists {
            return Err(AuthnError::AlreadyExists);
        }
        tables.oauth_principals.push(principal.clone());
        Ok(())
    }

    async fn get_oauth_principal(&self, id: &PrincipalId) -> AuthnResult<OAuthPrincipal> {
        self.tables
            .lock()
            .oauth_principals
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn get_oauth_principal_by_provider(
        &self,
        provider_type: &str,
        provider_keys: &ProviderKeys,
        provider_user_id: &str,
    ) -> AuthnResult<OAuthPrincipal> {
        self.tables
            .lock()
            .oauth_principals
            .iter()
            .find(|p| same_provider(p, provider_type, provider_keys, provider_user_id))
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn list_oauth_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<OAuthPrincipal>> {
        Ok(self
            .tables
            .lock()
            .oauth_principals
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_oauth_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<OAuthPrincipal>> {
        Ok(self
            .tables
            .lock()
            .oauth_principals
            .iter()
            .filter(|p| has_claim(&p.claims, name, value))
            .cloned()
            .collect())
    }

    async fn update_oauth_principal(&self, principal: &OAuthPrincipal) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let stored = tables
            .oauth_principals
            .iter_mut()
            .find(|p| p.id == principal.id)
            .ok_or(AuthnError::NotFound)?;
        *stored = principal.clone();
        Ok(())
    }

    async fn delete_oauth_principal(&self, id: &PrincipalId) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        let before = tables.oauth_principals.len();
        tables.oauth_principals.retain(|p| &p.id != id);
        if tables.oauth_principals.len() == before {
            return Err(AuthnError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Anonymous / Custom Token Principal Repository Implementations
// ============================================================================

impl AnonymousPrincipalRepository for InMemoryStore {
    async fn create_anonymous_principal(&self, principal: &AnonymousPrincipal) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        if tables
            .anonymous_principals
            .iter()
            .any(|p| p.id == principal.id || p.key_id == principal.key_id)
        {
            return Err(AuthnError::AlreadyExists);
        }
        tables.anonymous_principals.push(principal.clone());
        Ok(())
    }

    async fn get_anonymous_principal(&self, id: &PrincipalId) -> AuthnResult<AnonymousPrincipal> {
        self.tables
            .lock()
            .anonymous_principals
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn list_anonymous_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<AnonymousPrincipal>> {
        Ok(self
            .tables
            .lock()
            .anonymous_principals
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl CustomTokenPrincipalRepository for InMemoryStore {
    async fn create_custom_token_principal(
        &self,
        principal: &CustomTokenPrincipal,
    ) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        if tables
            .custom_token_principals
            .iter()
            .any(|p| p.id == principal.id || p.token_principal_id == principal.token_principal_id)
        {
            return Err(AuthnError::AlreadyExists);
        }
        tables.custom_token_principals.push(principal.clone());
        Ok(())
    }

    async fn get_custom_token_principal(
        &self,
        id: &PrincipalId,
    ) -> AuthnResult<CustomTokenPrincipal> {
        self.tables
            .lock()
            .custom_token_principals
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }

    async fn list_custom_token_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<CustomTokenPrincipal>> {
        Ok(self
            .tables
            .lock()
            .custom_token_principals
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Authorization Code / Session / Authenticator Repository Implementations
// ============================================================================

impl AuthorizationCodeRepository for InMemoryStore {
    async fn create_code(&self, code: &AuthorizationCode) -> AuthnResult<()> {
        let mut tables = self.tables.lock();
        if tables.codes.contains_key(&code.code_hash) {
            return Err(AuthnError::AlreadyExists);
        }
        tables.codes.insert(code.code_hash.clone(), code.clone());
        Ok(())
    }

    async fn consume_code(&self, code_hash: &str) -> AuthnResult<AuthorizationCode> {
        self.tables
            .lock()
            .codes
            .remove(code_hash)
            .ok_or(AuthnError::NotFound)
    }
}

impl SessionRepository for InMemoryStore {
    async fn create_session(&self, session: &Session) -> AuthnResult<()> {
        #[cfg(test)]
        if self
            .session_writes_down
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(AuthnError::Store("session table unavailable".to_string()));
        }
        let mut tables = self.tables.lock();
        if tables.sessions.contains_key(&session.id) {
            return Err(AuthnError::AlreadyExists);
        }
        tables.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: &SessionId) -> AuthnResult<Session> {
        self.tables
            .lock()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(AuthnError::NotFound)
    }
}

impl AuthenticatorRepository for InMemoryStore {
    async fn create_authenticator(&self, authenticator: &Authenticator) -> AuthnResult<()> {
        self.tables.lock().authenticators.push(authenticator.clone());
        Ok(())
    }

    async fn list_authenticators(&self, user_id: &UserId) -> AuthnResult<Vec<Authenticator>> {
        Ok(self
            .tables
            .lock()
            .authenticators
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Principal Type Registry
// ============================================================================

#[async_trait]
impl PrincipalTypeRegistry for InMemoryStore {
    async fn principal_type(&self, id: &PrincipalId) -> AuthnResult<Option<ProviderType>> {
        let tables = self.tables.lock();
        let provider_type = if tables.password_principals.iter().any(|p| &p.id == id) {
            Some(ProviderType::Password)
        } else if tables.oauth_principals.iter().any(|p| &p.id == id) {
            Some(ProviderType::OAuth)
        } else if tables.anonymous_principals.iter().any(|p| &p.id == id) {
            Some(ProviderType::Anonymous)
        } else if tables.custom_token_principals.iter().any(|p| &p.id == id) {
            Some(ProviderType::CustomToken)
        } else {
            None
        };
        Ok(provider_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::authorization_code::CodeAction;
    use crate::test_support::{fixed_now, seed_password_principal};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_password_batch_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let existing =
            seed_password_principal(&store, UserId::new(), "email", "a@example.com", "default")
                .await;

        let mut fresh = existing.clone();
        fresh.id = PrincipalId::new();
        fresh.login_id = "b@example.com".to_string();
        let mut clash = existing.clone();
        clash.id = PrincipalId::new();

        assert!(matches!(
            store.create_password_principals(&[fresh.clone(), clash]).await,
            Err(AuthnError::AlreadyExists)
        ));
        assert!(store.get_password_principal(&fresh.id).await.is_err());

        // Same value under another key is a different login ID
        let mut other_key = existing.clone();
        other_key.id = PrincipalId::new();
        other_key.login_id_key = "username".to_string();
        assert!(store.create_password_principals(&[other_key]).await.is_ok());
    }

    #[tokio::test]
    async fn test_registry_knows_every_kind() {
        let store = InMemoryStore::new();
        let password =
            seed_password_principal(&store, UserId::new(), "email", "a@example.com", "default")
                .await;
        let anon = AnonymousPrincipal::new(UserId::new(), "device", fixed_now());
        store.create_anonymous_principal(&anon).await.unwrap();

        assert_eq!(
            store.principal_type(&password.id).await.unwrap(),
            Some(ProviderType::Password)
        );
        assert_eq!(
            store.principal_type(&anon.id).await.unwrap(),
            Some(ProviderType::Anonymous)
        );
        assert_eq!(store.principal_type(&PrincipalId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_consume_is_at_most_once() {
        let store = Arc::new(InMemoryStore::new());
        let (record, _code) = AuthorizationCode::issue(
            CodeAction::Login,
            None,
            UserId::new(),
            PrincipalId::new(),
            None,
            fixed_now(),
            chrono::Duration::minutes(5),
        );
        store.create_code(&record).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let hash = record.code_hash.clone();
                tokio::spawn(async move { store.consume_code(&hash).await.is_ok() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
