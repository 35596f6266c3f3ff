//! Identity
//!
//! Serializable projection of a principal, as exposed to hooks and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entity::principal::{Principal, PrincipalInfo};
use crate::domain::value_object::{claims::Claims, ids::PrincipalId, provider_type::ProviderType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: PrincipalId,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub attributes: Value,
    pub claims: Claims,
}

impl From<&Principal> for Identity {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.principal_id(),
            provider_type: principal.provider_type(),
            attributes: principal.attributes(),
            claims: principal.claims(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::anonymous_principal::AnonymousPrincipal;
    use crate::domain::value_object::ids::UserId;

    #[test]
    fn test_identity_json_shape() {
        let principal = Principal::from(AnonymousPrincipal::new(
            UserId::new(),
            "k",
            chrono::Utc::now(),
        ));
        let json = serde_json::to_value(principal.to_identity()).unwrap();
        assert_eq!(json["type"], "anonymous");
        assert_eq!(json["attributes"]["key_id"], "k");
        assert_eq!(json["id"], principal.principal_id().to_string());
    }
}
