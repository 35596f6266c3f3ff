//! Hook dispatch shared by the use cases

use crate::domain::entity::{event::AuthEvent, user::User};
use crate::domain::repository::AuthnStore;
use crate::domain::services::HookDispatcher;
use crate::error::AuthnResult;

/// Dispatch `event` and persist the profile if a hook rewrote it.
///
/// Hooks may only change profile metadata; account changes are discarded.
pub(crate) async fn dispatch_event<S, H>(
    store: &S,
    hooks: &H,
    event: &AuthEvent,
    user: &mut User,
) -> AuthnResult<()>
where
    S: AuthnStore,
    H: HookDispatcher + Sync,
{
    let account = user.account.clone();
    let profile = user.profile.clone();

    hooks.dispatch(event, user).await.inspect_err(|e| {
        tracing::info!(event = event.name(), user_id = %account.id, error = %e, "Hook aborted operation");
    })?;

    user.account = account;
    if user.profile != profile {
        user.profile.user_id = profile.user_id;
        user.profile.created_at = profile.created_at;
        store.update_profile(&user.profile).await?;
        tracing::debug!(event = event.name(), user_id = %profile.user_id, "Profile updated by hook");
    }
    Ok(())
}
