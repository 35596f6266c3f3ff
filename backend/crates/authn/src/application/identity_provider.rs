//! Identity Provider Aggregator
//!
//! Fans principal lookups out across every registered credential kind, and
//! the per-kind adapters that expose the store as [`PrincipalProvider`]s.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entity::principal::{Principal, PrincipalInfo};
use crate::domain::repository::AuthnStore;
use crate::domain::services::{PrincipalProvider, PrincipalTypeRegistry};
use crate::domain::value_object::{
    ids::{PrincipalId, UserId},
    provider_type::ProviderType,
};
use crate::error::{AuthnError, AuthnResult};

/// Ordered set of principal providers plus the id -> kind registry
#[derive(Clone)]
pub struct IdentityProviderAggregator {
    providers: Vec<Arc<dyn PrincipalProvider>>,
    registry: Arc<dyn PrincipalTypeRegistry>,
}

impl IdentityProviderAggregator {
    pub fn new(
        providers: Vec<Arc<dyn PrincipalProvider>>,
        registry: Arc<dyn PrincipalTypeRegistry>,
    ) -> Self {
        Self {
            providers,
            registry,
        }
    }

    /// All four kinds backed by one store, in the order
    /// password, oauth, anonymous, custom token.
    pub fn for_store<S>(store: Arc<S>) -> Self
    where
        S: AuthnStore + PrincipalTypeRegistry,
    {
        let providers: Vec<Arc<dyn PrincipalProvider>> = vec![
            Arc::new(PasswordPrincipalProvider::new(store.clone())),
            Arc::new(OAuthPrincipalProvider::new(store.clone())),
            Arc::new(AnonymousPrincipalProvider::new(store.clone())),
            Arc::new(CustomTokenPrincipalProvider::new(store.clone())),
        ];
        Self::new(providers, store)
    }

    /// Concatenation of every provider's result, in registration order.
    pub async fn list_principals_by_user_id(&self, user_id: &UserId) -> AuthnResult<Vec<Principal>> {
        let mut principals = Vec::new();
        for provider in &self.providers {
            principals.extend(provider.list_principals_by_user_id(user_id).await?);
        }
        Ok(principals)
    }

    pub async fn list_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<Principal>> {
        let mut principals = Vec::new();
        for provider in &self.providers {
            principals.extend(provider.list_principals_by_claim(name, value).await?);
        }
        Ok(principals)
    }

    pub async fn get_principal_by_id(&self, id: &PrincipalId) -> AuthnResult<Principal> {
        let Some(provider_type) = self.registry.principal_type(id).await? else {
            return Err(AuthnError::NotFound);
        };

        let Some(provider) = self.providers.iter().find(|p| p.id() == provider_type) else {
            tracing::error!(
                principal_id = %id,
                provider_type = %provider_type,
                "No principal provider registered for type"
            );
            return Err(AuthnError::NotFound);
        };

        let principal = provider.get_principal_by_id(id).await?;
        if principal.provider_type() != provider_type {
            return Err(AuthnError::Fatal(format!(
                "provider {} returned a {} principal",
                provider_type,
                principal.provider_type()
            )));
        }
        Ok(principal)
    }
}

// ============================================================================
// Store-backed providers
// ============================================================================

pub struct PasswordPrincipalProvider<S> {
    store: Arc<S>,
}

impl<S> PasswordPrincipalProvider<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: AuthnStore> PrincipalProvider for PasswordPrincipalProvider<S> {
    fn id(&self) -> ProviderType {
        ProviderType::Password
    }

    async fn list_principals_by_user_id(&self, user_id: &UserId) -> AuthnResult<Vec<Principal>> {
        let principals = self.store.list_password_principals_by_user(user_id).await?;
        Ok(principals.into_iter().map(Principal::from).collect())
    }

    async fn list_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<Principal>> {
        let principals = self
            .store
            .list_password_principals_by_claim(name, value)
            .await?;
        Ok(principals.into_iter().map(Principal::from).collect())
    }

    async fn get_principal_by_id(&self, id: &PrincipalId) -> AuthnResult<Principal> {
        Ok(self.store.get_password_principal(id).await?.into())
    }
}

pub struct OAuthPrincipalProvider<S> {
    store: Arc<S>,
}

impl<S> OAuthPrincipalProvider<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: AuthnStore> PrincipalProvider for OAuthPrincipalProvider<S> {
    fn id(&self) -> ProviderType {
        ProviderType::OAuth
    }

    async fn list_principals_by_user_id(&self, user_id: &UserId) -> AuthnResult<Vec<Principal>> {
        let principals = self.store.list_oauth_principals_by_user(user_id).await?;
        Ok(principals.into_iter().map(Principal::from).collect())
    }

    async fn list_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<Principal>> {
        let principals = self.store.list_oauth_principals_by_claim(name, value).await?;
        Ok(principals.into_iter().map(Principal::from).collect())
    }

    async fn get_principal_by_id(&self, id: &PrincipalId) -> AuthnResult<Principal> {
        Ok(self.store.get_oauth_principal(id).await?.into())
    }
}

pub struct AnonymousPrincipalProvider<S> {
    store: Arc<S>,
}

impl<S> AnonymousPrincipalProvider<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: AuthnStore> PrincipalProvider for AnonymousPrincipalProvider<S> {
    fn id(&self) -> ProviderType {
        ProviderType::Anonymous
    }

    async fn list_principals_by_user_id(&self, user_id: &UserId) -> AuthnResult<Vec<Principal>> {
        let principals = self.store.list_anonymous_principals_by_user(user_id).await?;
        Ok(principals.into_iter().map(Principal::from).collect())
    }

    async fn list_principals_by_claim(
        &self,
        _name: &str,
        _value: &str,
    ) -> AuthnResult<Vec<Principal>> {
        Ok(Vec::new())
    }

    async fn get_principal_by_id(&self, id: &PrincipalId) -> AuthnResult<Principal> {
        Ok(self.store.get_anonymous_principal(id).await?.into())
    }
}

pub struct CustomTokenPrincipalProvider<S> {
    store: Arc<S>,
}

impl<S> CustomTokenPrincipalProvider<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: AuthnStore> PrincipalProvider for CustomTokenPrincipalProvider<S> {
    fn id(&self) -> ProviderType {
        ProviderType::CustomToken
    }

    async fn list_principals_by_user_id(&self, user_id: &UserId) -> AuthnResult<Vec<Principal>> {
        let principals = self
            .store
            .list_custom_token_principals_by_user(user_id)
            .await?;
        Ok(principals.into_iter().map(Principal::from).collect())
    }

    async fn list_principals_by_claim(
        &self,
        _name: &str,
        _value: &str,
    ) -> AuthnResult<Vec<Principal>> {
        Ok(Vec::new())
    }

    async fn get_principal_by_id(&self, id: &PrincipalId) -> AuthnResult<Principal> {
        Ok(self.store.get_custom_token_principal(id).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::anonymous_principal::AnonymousPrincipal;
    use crate::domain::repository::AnonymousPrincipalRepository;
    use crate::infra::memory::InMemoryStore;
    use crate::test_support::{fixed_now, seed_oauth_principal, seed_password_principal};

    #[tokio::test]
    async fn test_list_by_user_spans_all_kinds_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let aggregator = IdentityProviderAggregator::for_store(store.clone());
        let user_id = UserId::new();

        let anon = AnonymousPrincipal::new(user_id, "device", fixed_now());
        store.create_anonymous_principal(&anon).await.unwrap();
        seed_oauth_principal(&store, user_id, "sub-1", Some("a@example.com")).await;
        seed_password_principal(&store, user_id, "email", "a@example.com", "default").await;

        let types: Vec<_> = aggregator
            .list_principals_by_user_id(&user_id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.provider_type())
            .collect();
        assert_eq!(
            types,
            vec![ProviderType::Password, ProviderType::OAuth, ProviderType::Anonymous]
        );
    }

    #[tokio::test]
    async fn test_list_by_claim_ignores_claimless_kinds() {
        let store = Arc::new(InMemoryStore::new());
        let aggregator = IdentityProviderAggregator::for_store(store.clone());
        let user_id = UserId::new();
        seed_password_principal(&store, user_id, "email", "a@example.com", "default").await;
        seed_oauth_principal(&store, UserId::new(), "sub-1", Some("a@example.com")).await;

        let found = aggregator
            .list_principals_by_claim("email", "a@example.com")
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(
            aggregator
                .list_principals_by_claim("email", "nobody@example.com")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_get_by_id_routes_through_registry() {
        let store = Arc::new(InMemoryStore::new());
        let aggregator = IdentityProviderAggregator::for_store(store.clone());
        let principal = seed_oauth_principal(&store, UserId::new(), "sub-9", None).await;

        let found = aggregator.get_principal_by_id(&principal.id).await.unwrap();
        assert_eq!(found.as_oauth(), Some(&principal));

        assert!(matches!(
            aggregator.get_principal_by_id(&PrincipalId::new()).await,
            Err(AuthnError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_without_provider_for_type() {
        let store = Arc::new(InMemoryStore::new());
        let only_password: Vec<Arc<dyn PrincipalProvider>> =
            vec![Arc::new(PasswordPrincipalProvider::new(store.clone()))];
        let aggregator = IdentityProviderAggregator::new(only_password, store.clone());
        let principal = seed_oauth_principal(&store, UserId::new(), "sub-2", None).await;

        assert!(matches!(
            aggregator.get_principal_by_id(&principal.id).await,
            Err(AuthnError::NotFound)
        ));
    }
}
