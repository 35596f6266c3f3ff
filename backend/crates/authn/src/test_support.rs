//! Shared test fixtures

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use platform::password::{ClearTextPassword, HashParams};
use serde_json::{Map, Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::{
    AuthenticateProcess, AuthnConfig, IdentityProviderAggregator, OAuthCoordinator,
    SessionProvider, SignupProcess,
};
use crate::domain::entity::{
    event::AuthEvent,
    oauth_principal::OAuthPrincipal,
    password_principal::PasswordPrincipal,
    task::Task,
    user::{User, UserAccount, UserProfile},
};
use crate::domain::repository::{
    OAuthPrincipalRepository, PasswordPrincipalRepository, UserProfileRepository, UserRepository,
};
use crate::domain::services::{HookDispatcher, TaskQueue, TimeProvider};
use crate::domain::sso::{ProviderConfig, SsoAuthInfo, SsoProviderType};
use crate::domain::value_object::{claims::StandardKey, ids::UserId, login_id::LoginId};
use crate::error::{AuthnError, AuthnResult};
use crate::infra::{DefaultLoginIdChecker, InMemoryStore, PolicyPasswordChecker};

/// Password used by every seeded password principal
pub const PASSWORD: &str = "correct-horse-battery";

/// 2024-01-01T00:00:00Z
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap()
}

/// Route `tracing` output through the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authn=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Clock that only moves when told to
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for FixedClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(fixed_now()),
        }
    }
}

impl FixedClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl TimeProvider for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Hook dispatcher that records event names and can reject or rewrite
#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<&'static str>>,
    reject: Option<&'static str>,
    set_metadata: Option<(String, Value)>,
}

impl RecordingHooks {
    pub fn rejecting(event_name: &'static str) -> Self {
        Self {
            reject: Some(event_name),
            ..Default::default()
        }
    }

    pub fn setting_metadata(key: &str, value: Value) -> Self {
        Self {
            set_metadata: Some((key.to_string(), value)),
            ..Default::default()
        }
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }
}

impl HookDispatcher for RecordingHooks {
    async fn dispatch(&self, event: &AuthEvent, user: &mut User) -> AuthnResult<()> {
        self.events.lock().push(event.name());
        if self.reject == Some(event.name()) {
            return Err(AuthnError::EventRejected(format!("{} rejected", event.name())));
        }
        if let Some((key, value)) = &self.set_metadata {
            user.profile.metadata.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Task queue that records task names and can fail on one of them
#[derive(Default)]
pub struct RecordingTaskQueue {
    names: Mutex<Vec<&'static str>>,
    fail_on: Option<&'static str>,
}

impl RecordingTaskQueue {
    pub fn failing_on(task_name: &'static str) -> Self {
        Self {
            fail_on: Some(task_name),
            ..Default::default()
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.names.lock().clone()
    }
}

impl TaskQueue for RecordingTaskQueue {
    fn enqueue(&self, task: Task) -> AuthnResult<()> {
        if self.fail_on == Some(task.name()) {
            return Err(AuthnError::Internal("queue unavailable".to_string()));
        }
        self.names.lock().push(task.name());
        Ok(())
    }
}

pub fn google_info(sub: &str, email: Option<&str>) -> SsoAuthInfo {
    let mut profile = json!({ "sub": sub });
    if let Some(email) = email {
        profile["email"] = json!(email);
    }
    SsoAuthInfo::from_raw_profile(
        ProviderConfig::new("google", SsoProviderType::Google),
        json!({ "access_token": format!("at-{sub}") }),
        profile,
    )
    .unwrap()
}

pub async fn seed_password_principal(
    store: &InMemoryStore,
    user_id: UserId,
    key: &str,
    value: &str,
    realm: &str,
) -> PasswordPrincipal {
    let standard_key = match key {
        "email" => Some(StandardKey::Email),
        "phone" => Some(StandardKey::Phone),
        "username" => Some(StandardKey::Username),
        _ => None,
    };
    let hashed = ClearTextPassword::new(PASSWORD)
        .hash_with(HashParams::insecure_fast(), None)
        .unwrap();
    let principal = PasswordPrincipal::new(
        user_id,
        &LoginId::new(key, value),
        realm,
        hashed,
        standard_key,
        fixed_now(),
    );
    store
        .create_password_principals(std::slice::from_ref(&principal))
        .await
        .unwrap();
    principal
}

pub async fn seed_oauth_principal(
    store: &InMemoryStore,
    user_id: UserId,
    sub: &str,
    email: Option<&str>,
) -> OAuthPrincipal {
    let principal = OAuthPrincipal::new(user_id, &google_info(sub, email), fixed_now());
    store.create_oauth_principal(&principal).await.unwrap();
    principal
}

/// One tenant's worth of wiring over an in-memory store
pub struct TestEnv {
    pub store: Arc<InMemoryStore>,
    pub hooks: Arc<RecordingHooks>,
    pub clock: Arc<FixedClock>,
    pub config: Arc<AuthnConfig>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_hooks(RecordingHooks::default())
    }

    pub fn with_hooks(hooks: RecordingHooks) -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            hooks: Arc::new(hooks),
            clock: Arc::new(FixedClock::default()),
            config: Arc::new(AuthnConfig::development()),
        }
    }

    /// Components built afterwards see the change.
    pub fn set_config(&mut self, change: impl FnOnce(&mut AuthnConfig)) {
        change(Arc::make_mut(&mut self.config));
    }

    fn identity_provider(&self) -> IdentityProviderAggregator {
        IdentityProviderAggregator::for_store(self.store.clone())
    }

    pub fn authenticate_process(&self) -> AuthenticateProcess<InMemoryStore> {
        AuthenticateProcess::new(
            self.store.clone(),
            self.identity_provider(),
            Arc::new(DefaultLoginIdChecker::default()),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    pub fn signup_process(&self) -> SignupProcess<InMemoryStore, RecordingHooks> {
        self.signup_process_with_checker(DefaultLoginIdChecker::default())
    }

    pub fn signup_process_with_checker(
        &self,
        login_id_checker: DefaultLoginIdChecker,
    ) -> SignupProcess<InMemoryStore, RecordingHooks> {
        SignupProcess::new(
            self.store.clone(),
            self.identity_provider(),
            Arc::new(login_id_checker),
            Arc::new(PolicyPasswordChecker::new(self.config.password_policy.clone())),
            self.hooks.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    pub fn oauth_coordinator(&self) -> OAuthCoordinator<InMemoryStore, RecordingHooks> {
        OAuthCoordinator::new(
            self.store.clone(),
            Arc::new(self.authenticate_process()),
            Arc::new(self.signup_process()),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    pub fn session_provider(&self) -> SessionProvider<InMemoryStore, RecordingHooks> {
        SessionProvider::new(
            self.store.clone(),
            self.identity_provider(),
            self.hooks.clone(),
            self.clock.clone(),
            self.config.clone(),
        )
    }

    pub async fn seed_user(&self) -> User {
        self.seed_user_with_id(UserId::new()).await
    }

    pub async fn seed_user_with_id(&self, user_id: UserId) -> User {
        let mut account = UserAccount::new(fixed_now());
        account.id = user_id;
        let profile = UserProfile::new(user_id, Map::new(), fixed_now());
        self.store.create_user(&account).await.unwrap();
        self.store.create_profile(&profile).await.unwrap();
        User::new(account, profile)
    }
}
