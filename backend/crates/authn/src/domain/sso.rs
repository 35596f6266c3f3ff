//! Federated login (SSO) types
//!
//! What the OAuth layer hands to the core after talking to a provider: the
//! provider configuration, the raw token response and profile, and the decoded
//! user info (subject id and email).

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_object::{
    claims::{Claims, StandardKey},
    email::Email,
    ids::UserId,
    on_user_duplicate::OnUserDuplicate,
};
use crate::error::{AuthnError, AuthnResult};

/// Extra keys that, together with the provider type, identify a provider
/// instance (e.g. an Azure AD tenant).
pub type ProviderKeys = BTreeMap<String, String>;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsoProviderType {
    #[display("google")]
    Google,
    #[display("facebook")]
    Facebook,
    #[display("instagram")]
    Instagram,
    #[display("linkedin")]
    LinkedIn,
    #[display("azureadv2")]
    AzureAdV2,
    #[display("apple")]
    Apple,
}

impl SsoProviderType {
    /// Profile field holding the provider's subject id
    const fn subject_field(&self) -> &'static str {
        match self {
            Self::Google | Self::AzureAdV2 | Self::Apple => "sub",
            Self::Facebook | Self::Instagram | Self::LinkedIn => "id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: SsoProviderType,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, provider_type: SsoProviderType) -> Self {
        Self {
            id: id.into(),
            provider_type,
            client_id: String::new(),
            tenant: None,
            team_id: None,
        }
    }

    pub fn provider_keys(&self) -> ProviderKeys {
        let mut keys = ProviderKeys::new();
        match self.provider_type {
            SsoProviderType::AzureAdV2 => {
                if let Some(tenant) = &self.tenant {
                    keys.insert("tenant".to_string(), tenant.clone());
                }
            }
            SsoProviderType::Apple => {
                if let Some(team_id) = &self.team_id {
                    keys.insert("team_id".to_string(), team_id.clone());
                }
            }
            _ => {}
        }
        keys
    }
}

/// Decoded, provider-independent view of a federated profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUserInfo {
    pub id: String,
    pub email: Option<String>,
}

impl ProviderUserInfo {
    pub fn claims(&self) -> Claims {
        let mut claims = Claims::new();
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            claims.insert(StandardKey::Email.claim_name().to_string(), email.to_string());
        }
        claims
    }
}

/// Decode a raw profile for the given provider type.
///
/// Numeric subject ids are accepted and stringified. An email that fails the
/// format check is dropped rather than rejected.
pub fn decode_user_info(
    provider_type: SsoProviderType,
    raw_profile: &Value,
) -> AuthnResult<ProviderUserInfo> {
    let id = match raw_profile.get(provider_type.subject_field()) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(AuthnError::Internal(format!(
                "{} profile has no subject id",
                provider_type
            )));
        }
    };

    let email = raw_profile
        .get("email")
        .and_then(Value::as_str)
        .and_then(|e| Email::new(e).ok())
        .map(Email::into_inner);

    Ok(ProviderUserInfo { id, email })
}

/// Everything the core needs about one successful federated login
#[derive(Debug, Clone, PartialEq)]
pub struct SsoAuthInfo {
    pub provider_config: ProviderConfig,
    pub provider_access_token_resp: Value,
    pub provider_raw_profile: Value,
    pub provider_user_info: ProviderUserInfo,
}

impl SsoAuthInfo {
    pub fn from_raw_profile(
        provider_config: ProviderConfig,
        provider_access_token_resp: Value,
        provider_raw_profile: Value,
    ) -> AuthnResult<Self> {
        let provider_user_info =
            decode_user_info(provider_config.provider_type, &provider_raw_profile)?;
        Ok(Self {
            provider_config,
            provider_access_token_resp,
            provider_raw_profile,
            provider_user_info,
        })
    }

    pub fn email(&self) -> Option<&str> {
        self.provider_user_info
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
    }
}

/// Client-supplied state of a login flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginState {
    #[serde(default)]
    pub on_user_duplicate: OnUserDuplicate,
}

/// Client-supplied state of a link flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkState {
    pub user_id: UserId,
}
