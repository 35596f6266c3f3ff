//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the infrastructure
//! layer and must report `NotFound`, `AlreadyExists` and
//! `MultipleResultsFound` distinctly; uniqueness is enforced there.

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
use crate::domain::sso::ProviderKeys;
use crate::domain::value_object::{
    ids::{PrincipalId, SessionId, UserId},
    login_id::LoginId,
};
use crate::error::AuthnResult;

/// User account repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn create_user(&self, account: &UserAccount) -> AuthnResult<()>;

    async fn get_user(&self, user_id: &UserId) -> AuthnResult<UserAccount>;

    async fn update_user(&self, account: &UserAccount) -> AuthnResult<()>;

    async fn delete_user(&self, user_id: &UserId) -> AuthnResult<()>;
}

/// User profile repository trait
#[trait_variant::make(UserProfileRepository: Send)]
pub trait LocalUserProfileRepository {
    async fn create_profile(&self, profile: &UserProfile) -> AuthnResult<()>;

    async fn get_profile(&self, user_id: &UserId) -> AuthnResult<UserProfile>;

    async fn update_profile(&self, profile: &UserProfile) -> AuthnResult<()>;

    async fn delete_profile(&self, user_id: &UserId) -> AuthnResult<()>;
}

/// Password principal repository trait
#[trait_variant::make(PasswordPrincipalRepository: Send)]
pub trait LocalPasswordPrincipalRepository {
    /// Insert all or none. A duplicate `(login_id_key, login_id, realm)` fails
    /// with `AlreadyExists`.
    async fn create_password_principals(&self, principals: &[PasswordPrincipal])
    -> AuthnResult<()>;

    async fn get_password_principal(&self, id: &PrincipalId) -> AuthnResult<PasswordPrincipal>;

    /// Match on value and realm; an empty key matches any key.
    async fn list_password_principals_by_login_id(
        &self,
        login_id: &LoginId,
        realm: &str,
    ) -> AuthnResult<Vec<PasswordPrincipal>>;

    async fn list_password_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<PasswordPrincipal>>;

    async fn list_password_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<PasswordPrincipal>>;

    async fn update_password_principal(&self, principal: &PasswordPrincipal) -> AuthnResult<()>;

    async fn delete_password_principal(&self, id: &PrincipalId) -> AuthnResult<()>;
}

/// OAuth principal repository trait
#[trait_variant::make(OAuthPrincipalRepository: Send)]
pub trait LocalOAuthPrincipalRepository {
    /// A duplicate `(provider_type, provider_keys, provider_user_id)` fails with `AlreadyExists`.
    async fn create_oauth_principal(&self, principal: &OAuthPrincipal) -> AuthnResult<()>;

    async fn get_oauth_principal(&self, id: &PrincipalId) -> AuthnResult<OAuthPrincipal>;

    async fn get_oauth_principal_by_provider(
        &self,
        provider_type: &str,
        provider_keys: &ProviderKeys,
        provider_user_id: &str,
    ) -> AuthnResult<OAuthPrincipal>;

    async fn list_oauth_principals_by_user(&self, user_id: &UserId)
    -> AuthnResult<Vec<OAuthPrincipal>>;

    async fn list_oauth_principals_by_claim(
        &self,
        name: &str,
        value: &str,
    ) -> AuthnResult<Vec<OAuthPrincipal>>;

    async fn update_oauth_principal(&self, principal: &OAuthPrincipal) -> AuthnResult<()>;

    async fn delete_oauth_principal(&self, id: &PrincipalId) -> AuthnResult<()>;
}

/// Anonymous principal repository trait
#[trait_variant::make(AnonymousPrincipalRepository: Send)]
pub trait LocalAnonymousPrincipalRepository {
    async fn create_anonymous_principal(&self, principal: &AnonymousPrincipal) -> AuthnResult<()>;

    async fn get_anonymous_principal(&self, id: &PrincipalId) -> AuthnResult<AnonymousPrincipal>;

    async fn list_anonymous_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<AnonymousPrincipal>>;
}

/// Custom token principal repository trait
#[trait_variant::make(CustomTokenPrincipalRepository: Send)]
pub trait LocalCustomTokenPrincipalRepository {
    async fn create_custom_token_principal(
        &self,
        principal: &CustomTokenPrincipal,
    ) -> AuthnResult<()>;

    async fn get_custom_token_principal(
        &self,
        id: &PrincipalId,
    ) -> AuthnResult<CustomTokenPrincipal>;

    async fn list_custom_token_principals_by_user(
        &self,
        user_id: &UserId,
    ) -> AuthnResult<Vec<CustomTokenPrincipal>>;
}

/// Authorization code repository trait
#[trait_variant::make(AuthorizationCodeRepository: Send)]
pub trait LocalAuthorizationCodeRepository {
    async fn create_code(&self, code: &AuthorizationCode) -> AuthnResult<()>;

    /// Atomically fetch and delete. At most one caller receives the record.
    async fn consume_code(&self, code_hash: &str) -> AuthnResult<AuthorizationCode>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create_session(&self, session: &Session) -> AuthnResult<()>;

    async fn get_session(&self, session_id: &SessionId) -> AuthnResult<Session>;
}

/// Authenticator (second factor) repository trait
#[trait_variant::make(AuthenticatorRepository: Send)]
pub trait LocalAuthenticatorRepository {
    async fn create_authenticator(&self, authenticator: &Authenticator) -> AuthnResult<()>;

    async fn list_authenticators(&self, user_id: &UserId) -> AuthnResult<Vec<Authenticator>>;
}

/// Every repository the use cases need, behind one handle
pub trait AuthnStore:
    UserRepository
    + UserProfileRepository
    + PasswordPrincipalRepository
    + OAuthPrincipalRepository
    + AnonymousPrincipalRepository
    + CustomTokenPrincipalRepository
    + AuthorizationCodeRepository
    + SessionRepository
    + AuthenticatorRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthnStore for T where
    T: UserRepository
        + UserProfileRepository
        + PasswordPrincipalRepository
        + OAuthPrincipalRepository
        + AnonymousPrincipalRepository
        + CustomTokenPrincipalRepository
        + AuthorizationCodeRepository
        + SessionRepository
        + AuthenticatorRepository
        + Send
        + Sync
        + 'static
{
}
