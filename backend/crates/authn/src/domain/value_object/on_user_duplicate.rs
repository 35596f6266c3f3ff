//! Policy for a new credential whose email is already claimed

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnUserDuplicate {
    /// Reject the request
    #[default]
    #[display("abort")]
    Abort,
    /// Create a separate account anyway
    #[display("create")]
    Create,
    /// Attach the credential to the existing account
    #[display("merge")]
    Merge,
}

impl OnUserDuplicate {
    /// `Abort` is always allowed; the others only when the tenant enables them.
    pub fn is_allowed(&self, allow_merge: bool, allow_create: bool) -> bool {
        match self {
            Self::Abort => true,
            Self::Merge => allow_merge,
            Self::Create => allow_create,
        }
    }
}
