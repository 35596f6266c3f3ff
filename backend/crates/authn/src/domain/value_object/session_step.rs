//! Authentication session steps

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStep {
    #[display("identity")]
    #[serde(rename = "identity")]
    Identity,
    #[display("mfa.setup")]
    #[serde(rename = "mfa.setup")]
    MfaSetup,
    #[display("mfa.authn")]
    #[serde(rename = "mfa.authn")]
    MfaAuthn,
}

impl SessionStep {
    pub fn is_mfa(&self) -> bool {
        matches!(self, Self::MfaSetup | Self::MfaAuthn)
    }
}

/// Why a session is being created
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCreateReason {
    #[display("login")]
    Login,
    #[display("signup")]
    Signup,
}
