//! Principal
//!
//! One credential binding of a user. The concrete kinds share the
//! [`PrincipalInfo`] capability; [`Principal`] is the closed union the use
//! cases pass around.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::entity::{
    anonymous_principal::AnonymousPrincipal, custom_token_principal::CustomTokenPrincipal,
    identity::Identity, oauth_principal::OAuthPrincipal, password_principal::PasswordPrincipal,
};
use crate::domain::value_object::{
    claims::Claims,
    ids::{PrincipalId, UserId},
    provider_type::ProviderType,
};

/// Capability shared by every principal kind
pub trait PrincipalInfo {
    fn principal_id(&self) -> PrincipalId;
    fn principal_user_id(&self) -> UserId;
    fn provider_type(&self) -> ProviderType;
    /// Provider-specific attributes
    fn attributes(&self) -> Value;
    /// Standardized claims; empty for kinds that publish none
    fn claims(&self) -> Claims;
}

impl PrincipalInfo for PasswordPrincipal {
    fn principal_id(&self) -> PrincipalId {
        self.id
    }
    fn principal_user_id(&self) -> UserId {
        self.user_id
    }
    fn provider_type(&self) -> ProviderType {
        ProviderType::Password
    }
    fn attributes(&self) -> Value {
        PasswordPrincipal::attributes(self)
    }
    fn claims(&self) -> Claims {
        self.claims.clone()
    }
}

impl PrincipalInfo for OAuthPrincipal {
    fn principal_id(&self) -> PrincipalId {
        self.id
    }
    fn principal_user_id(&self) -> UserId {
        self.user_id
    }
    fn provider_type(&self) -> ProviderType {
        ProviderType::OAuth
    }
    fn attributes(&self) -> Value {
        OAuthPrincipal::attributes(self)
    }
    fn claims(&self) -> Claims {
        self.claims.clone()
    }
}

impl PrincipalInfo for AnonymousPrincipal {
    fn principal_id(&self) -> PrincipalId {
        self.id
    }
    fn principal_user_id(&self) -> UserId {
        self.user_id
    }
    fn provider_type(&self) -> ProviderType {
        ProviderType::Anonymous
    }
    fn attributes(&self) -> Value {
        AnonymousPrincipal::attributes(self)
    }
    fn claims(&self) -> Claims {
        Claims::new()
    }
}

impl PrincipalInfo for CustomTokenPrincipal {
    fn principal_id(&self) -> PrincipalId {
        self.id
    }
    fn principal_user_id(&self) -> UserId {
        self.user_id
    }
    fn provider_type(&self) -> ProviderType {
        ProviderType::CustomToken
    }
    fn attributes(&self) -> Value {
        CustomTokenPrincipal::attributes(self)
    }
    fn claims(&self) -> Claims {
        Claims::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Password(PasswordPrincipal),
    OAuth(OAuthPrincipal),
    Anonymous(AnonymousPrincipal),
    CustomToken(CustomTokenPrincipal),
}

impl Principal {
    fn info(&self) -> &dyn PrincipalInfo {
        match self {
            Principal::Password(p) => p,
            Principal::OAuth(p) => p,
            Principal::Anonymous(p) => p,
            Principal::CustomToken(p) => p,
        }
    }

    /// Last modification, for kinds that track one
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Principal::Password(p) => Some(p.updated_at),
            Principal::OAuth(p) => Some(p.updated_at),
            Principal::CustomToken(p) => Some(p.updated_at),
            Principal::Anonymous(_) => None,
        }
    }

    pub fn as_password(&self) -> Option<&PasswordPrincipal> {
        match self {
            Principal::Password(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_oauth(&self) -> Option<&OAuthPrincipal> {
        match self {
            Principal::OAuth(p) => Some(p),
            _ => None,
        }
    }

    pub fn to_identity(&self) -> Identity {
        Identity::from(self)
    }
}

impl PrincipalInfo for Principal {
    fn principal_id(&self) -> PrincipalId {
        self.info().principal_id()
    }
    fn principal_user_id(&self) -> UserId {
        self.info().principal_user_id()
    }
    fn provider_type(&self) -> ProviderType {
        self.info().provider_type()
    }
    fn attributes(&self) -> Value {
        self.info().attributes()
    }
    fn claims(&self) -> Claims {
        self.info().claims()
    }
}

impl From<PasswordPrincipal> for Principal {
    fn from(p: PasswordPrincipal) -> Self {
        Principal::Password(p)
    }
}

impl From<OAuthPrincipal> for Principal {
    fn from(p: OAuthPrincipal) -> Self {
        Principal::OAuth(p)
    }
}

impl From<AnonymousPrincipal> for Principal {
    fn from(p: AnonymousPrincipal) -> Self {
        Principal::Anonymous(p)
    }
}

impl From<CustomTokenPrincipal> for Principal {
    fn from(p: CustomTokenPrincipal) -> Self {
        Principal::CustomToken(p)
    }
}
