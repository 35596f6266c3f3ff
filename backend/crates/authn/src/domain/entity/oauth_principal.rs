//! OAuth Principal
//!
//! A federated subject id at a provider instance bound to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::sso::{ProviderKeys, SsoAuthInfo};
use crate::domain::value_object::{
    claims::Claims,
    ids::{PrincipalId, UserId},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthPrincipal {
    pub id: PrincipalId,
    pub user_id: UserId,
    /// Provider type code, e.g. `google`
    pub provider_type: String,
    pub provider_keys: ProviderKeys,
    pub provider_user_id: String,
    pub access_token_resp: Value,
    pub user_profile: Value,
    pub claims: Claims,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthPrincipal {
    pub fn new(user_id: UserId, info: &SsoAuthInfo, now: DateTime<Utc>) -> Self {
        Self {
            id: PrincipalId::new(),
            user_id,
            provider_type: info.provider_config.provider_type.to_string(),
            provider_keys: info.provider_config.provider_keys(),
            provider_user_id: info.provider_user_info.id.clone(),
            access_token_resp: info.provider_access_token_resp.clone(),
            user_profile: info.provider_raw_profile.clone(),
            claims: info.provider_user_info.claims(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the stored token response, profile and claims with fresh ones.
    pub fn refresh(&mut self, info: &SsoAuthInfo, now: DateTime<Utc>) {
        self.access_token_resp = info.provider_access_token_resp.clone();
        self.user_profile = info.provider_raw_profile.clone();
        self.claims = info.provider_user_info.claims();
        self.updated_at = now;
    }

    pub fn attributes(&self) -> Value {
        json!({
            "provider_type": self.provider_type,
            "provider_keys": self.provider_keys,
            "provider_user_id": self.provider_user_id,
            "raw_profile": self.user_profile,
        })
    }
}
