//! Domain Services
//!
//! Ports to collaborators the core consumes but does not implement, plus the
//! single-result lookup helper shared by the use cases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use platform::password::ClearTextPassword;

use crate::domain::entity::{event::AuthEvent, principal::Principal, task::Task, user::User};
use crate::domain::value_object::{
    claims::StandardKey,
    ids::{PrincipalId, UserId},
    login_id::LoginId,
    provider_type::ProviderType,
    validation::ValidationCause,
};
use crate::error::{AuthnError, AuthnResult};

/// One credential kind's view of the principal store.
///
/// Object-safe so that the aggregator can hold a heterogeneous list.
#[async_trait]
pub trait PrincipalProvider: Send + Sync {
    fn id(&self) -> ProviderType;

    async fn list_principals_by_user_id(&self, user_id: &UserId) -> AuthnResult<Vec<Principal>>;

    /// Kinds that publish no claims return an empty list.
    async fn list_principals_by_claim(&self, name: &str, value: &str)
    -> AuthnResult<Vec<Principal>>;

    async fn get_principal_by_id(&self, id: &PrincipalId) -> AuthnResult<Principal>;
}

/// Maps a principal id to the kind that owns it.
#[async_trait]
pub trait PrincipalTypeRegistry: Send + Sync {
    /// `None` when no principal has this id.
    async fn principal_type(&self, id: &PrincipalId) -> AuthnResult<Option<ProviderType>>;
}

/// Login ID format rules. Pointers in returned causes are relative to the
/// login ID list (`/0/value`, `/1/key`, ...).
pub trait LoginIdChecker: Send + Sync {
    fn validate(&self, login_ids: &[LoginId]) -> Vec<ValidationCause>;

    fn check_type(&self, key: &str, standard_key: StandardKey) -> bool {
        self.standard_key(key) == Some(standard_key)
    }

    fn standard_key(&self, key: &str) -> Option<StandardKey>;

    /// Canonical stored form of a login ID.
    fn normalize(&self, login_id: &LoginId) -> LoginId {
        login_id.clone()
    }

    /// Stored forms to look up at login. A login ID without a key expands to
    /// one candidate per configured key, plus its keyless form.
    fn lookup_candidates(&self, login_id: &LoginId) -> Vec<LoginId> {
        vec![self.normalize(login_id)]
    }
}

pub trait PasswordChecker: Send + Sync {
    /// Fails with `PasswordPolicyViolated` listing every violated rule.
    fn validate_password(&self, password: &ClearTextPassword) -> AuthnResult<()>;
}

/// Sole source of timestamps
pub trait TimeProvider: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Synchronous event hooks
#[trait_variant::make(HookDispatcher: Send)]
pub trait LocalHookDispatcher {
    /// The hook may rewrite `user`. An error aborts the calling operation.
    async fn dispatch(&self, event: &AuthEvent, user: &mut User) -> AuthnResult<()>;
}

/// Fire-and-forget background work
pub trait TaskQueue: Send + Sync {
    fn enqueue(&self, task: Task) -> AuthnResult<()>;
}

/// The only element of `items`: `NotFound` when empty, `MultipleResultsFound`
/// when there is more than one.
pub fn exactly_one<T>(items: Vec<T>) -> AuthnResult<T> {
    let mut iter = items.into_iter();
    match (iter.next(), iter.next()) {
        (Some(item), None) => Ok(item),
        (None, _) => Err(AuthnError::NotFound),
        (Some(_), Some(_)) => Err(AuthnError::MultipleResultsFound),
    }
}
