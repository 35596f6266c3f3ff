//! Principal type discriminant

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Credential kind a principal binds. Used as the registry key when resolving
/// a principal id to the provider that owns it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[display("password")]
    Password,
    #[display("oauth")]
    #[serde(rename = "oauth")]
    OAuth,
    #[display("anonymous")]
    Anonymous,
    #[display("custom_token")]
    CustomToken,
}

impl ProviderType {
    pub const ALL: [ProviderType; 4] = [
        ProviderType::Password,
        ProviderType::OAuth,
        ProviderType::Anonymous,
        ProviderType::CustomToken,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::OAuth => "oauth",
            Self::Anonymous => "anonymous",
            Self::CustomToken => "custom_token",
        }
    }
}
