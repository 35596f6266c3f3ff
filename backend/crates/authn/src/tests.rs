//! End-to-end flows across the use cases, over the in-memory store.

use serde_json::Map;

use crate::application::config::{MfaEnforcement, WelcomeEmailConfig, WelcomeEmailDestination};
use crate::application::{MfaCase, StepResult, enqueue_tasks};
use crate::domain::entity::{
    authenticator::{Authenticator, AuthenticatorKind},
    principal::PrincipalInfo,
};
use crate::domain::repository::{AuthenticatorRepository, UserRepository};
use crate::domain::sso::LoginState;
use crate::domain::value_object::{
    login_id::LoginId,
    on_user_duplicate::OnUserDuplicate,
    session_step::{SessionCreateReason, SessionStep},
};
use crate::error::AuthnError;
use crate::test_support::{
    PASSWORD, RecordingTaskQueue, TestEnv, fixed_now, google_info, init_tracing,
};

fn email(value: &str) -> LoginId {
    LoginId::new("email", value)
}

mod password_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_signup_login_and_session() {
        init_tracing();
        let env = TestEnv::new();

        let signup = env
            .signup_process()
            .create_user_with_login_ids(
                &[email("Alice@Example.com")],
                PASSWORD,
                Map::new(),
                OnUserDuplicate::Abort,
            )
            .await
            .unwrap();

        let principal = env
            .authenticate_process()
            .authenticate_with_login_id(&email("alice@example.com"), PASSWORD)
            .await
            .unwrap();
        assert_eq!(principal.principal_user_id(), signup.user.id());

        let sessions = env.session_provider();
        let authn_session = sessions
            .begin_session("web", &signup.user.id(), &principal, SessionCreateReason::Login)
            .await
            .unwrap();
        let completed = sessions
            .step_session(&authn_session)
            .await
            .unwrap()
            .into_completed()
            .unwrap();

        assert_eq!(completed.session.user_id, signup.user.id());
        assert_eq!(completed.session.create_reason, SessionCreateReason::Login);
        assert_eq!(env.store.session_count(), 1);
        assert_eq!(env.hooks.event_names(), vec!["user.create", "session.create"]);

        let account = env.store.get_user(&signup.user.id()).await.unwrap();
        assert_eq!(account.last_login_at, Some(fixed_now()));

        // The issued token resolves back to the same session
        let again = sessions
            .make_result(
                "web",
                completed.session.clone(),
                completed.access_token.clone(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(again.principal.principal_id(), principal.principal_id());
    }

    #[tokio::test]
    async fn test_second_signup_with_same_email_fails() {
        let env = TestEnv::new();
        let signup = env.signup_process();

        signup
            .create_user_with_login_ids(&[email("a@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap();
        let err = signup
            .create_user_with_login_ids(&[email("A@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthnError::LoginIdAlreadyUsed));
        assert_eq!(env.store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_login_id_look_the_same() {
        let env = TestEnv::new();
        env.signup_process()
            .create_user_with_login_ids(&[email("a@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap();
        let authenticate = env.authenticate_process();

        let wrong = authenticate
            .authenticate_with_login_id(&email("a@example.com"), "not-the-password")
            .await
            .unwrap_err();
        let unknown = authenticate
            .authenticate_with_login_id(&email("b@example.com"), PASSWORD)
            .await
            .unwrap_err();

        assert!(matches!(wrong, AuthnError::InvalidCredentials));
        assert!(matches!(unknown, AuthnError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_signup_tasks_are_enqueued_after_success() {
        let mut env = TestEnv::new();
        env.set_config(|c| {
            c.welcome_email = WelcomeEmailConfig {
                enabled: true,
                destination: WelcomeEmailDestination::First,
            };
            c.user_verification.auto_send_on_signup = true;
            c.user_verification.login_id_keys = vec!["email".to_string()];
        });

        let output = env
            .signup_process()
            .create_user_with_login_ids(&[email("a@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap();

        let queue = RecordingTaskQueue::default();
        enqueue_tasks(&queue, output.tasks);
        assert_eq!(queue.names(), vec!["welcome_email", "verify_code"]);
    }
}

mod mfa_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_required_mfa_enrollment_then_completion() {
        let mut env = TestEnv::new();
        env.set_config(|c| c.mfa_enforcement = MfaEnforcement::Required);
        let output = env
            .signup_process()
            .create_user_with_login_ids(&[email("a@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap();
        let sessions = env.session_provider();

        let authn_session = sessions
            .begin_session(
                "web",
                &output.user.id(),
                &output.principals[0],
                SessionCreateReason::Signup,
            )
            .await
            .unwrap();
        let StepResult::InProgress(pending) = sessions.step_session(&authn_session).await.unwrap()
        else {
            panic!("expected a pending session");
        };
        assert_eq!(pending.step, SessionStep::MfaSetup);
        assert_eq!(env.store.session_count(), 0);

        let user_id = sessions
            .resolve_user_id(&pending.token, MfaCase::OnlyWhenNoAuthenticators)
            .await
            .unwrap();
        assert_eq!(user_id, output.user.id());

        // The MFA service enrolls the user and finishes the step
        let mut resumed = sessions.resolve_session(&pending.token).unwrap();
        assert_eq!(resumed, authn_session);
        resumed.finish_step(SessionStep::MfaSetup).unwrap();
        resumed.set_authenticator_bearer_token("bearer");

        let completed = sessions
            .step_session(&resumed)
            .await
            .unwrap()
            .into_completed()
            .unwrap();
        assert_eq!(completed.session.create_reason, SessionCreateReason::Signup);
        assert_eq!(completed.authenticator_bearer_token.as_deref(), Some("bearer"));
        assert_eq!(env.store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_enrolled_user_must_pass_mfa() {
        let mut env = TestEnv::new();
        env.set_config(|c| c.mfa_enforcement = MfaEnforcement::Optional);
        let output = env
            .signup_process()
            .create_user_with_login_ids(&[email("a@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap();
        env.store
            .create_authenticator(&Authenticator::new(
                output.user.id(),
                AuthenticatorKind::Totp,
                fixed_now(),
            ))
            .await
            .unwrap();
        let sessions = env.session_provider();

        let authn_session = sessions
            .begin_session(
                "web",
                &output.user.id(),
                &output.principals[0],
                SessionCreateReason::Login,
            )
            .await
            .unwrap();
        let err = sessions
            .step_session(&authn_session)
            .await
            .unwrap()
            .into_completed()
            .unwrap_err();
        let (token, step) = match err {
            AuthnError::AuthenticationSessionRequired { token, step } => (token, step),
            other => panic!("expected AuthenticationSessionRequired, got {other:?}"),
        };
        assert_eq!(step, SessionStep::MfaAuthn);

        assert!(matches!(
            sessions
                .resolve_user_id(&token, MfaCase::OnlyWhenNoAuthenticators)
                .await,
            Err(AuthnError::InvalidAuthenticationSession)
        ));
        assert_eq!(
            sessions
                .resolve_user_id(&token, MfaCase::AlwaysAccept)
                .await
                .unwrap(),
            output.user.id()
        );
    }

    #[tokio::test]
    async fn test_continuation_token_expires() {
        let mut env = TestEnv::new();
        env.set_config(|c| c.mfa_enforcement = MfaEnforcement::Required);
        let user = env.seed_user().await;
        let principal = crate::test_support::seed_password_principal(
            &env.store,
            user.id(),
            "email",
            "a@example.com",
            "default",
        )
        .await;
        let sessions = env.session_provider();

        let authn_session = sessions
            .begin_session("web", &user.id(), &principal.into(), SessionCreateReason::Login)
            .await
            .unwrap();
        let StepResult::InProgress(pending) = sessions.step_session(&authn_session).await.unwrap()
        else {
            panic!("expected a pending session");
        };

        env.clock.advance(chrono::Duration::minutes(6));
        assert!(matches!(
            sessions.resolve_session(&pending.token),
            Err(AuthnError::InvalidAuthenticationSession)
        ));
    }
}

mod oauth_flow_tests {
    use super::*;
    use platform::crypto::pkce_s256_challenge;

    const VERIFIER: &str = "dBjftJeZ4CVP-mJ92K9qJQ0WuTWsTr4cVhJ7f1yY0c8";

    #[tokio::test]
    async fn test_merge_into_password_user_then_exchange() {
        init_tracing();
        let mut env = TestEnv::new();
        env.set_config(|c| c.on_user_duplicate_allow_merge = true);
        let signup = env
            .signup_process()
            .create_user_with_login_ids(&[email("a@example.com")], PASSWORD, Map::new(), OnUserDuplicate::Abort)
            .await
            .unwrap();
        let oauth = env.oauth_coordinator();
        let info = google_info("sub-1", Some("a@example.com"));

        let issued = oauth
            .authenticate_code(
                &info,
                Some(pkce_s256_challenge(VERIFIER)),
                LoginState {
                    on_user_duplicate: OnUserDuplicate::Merge,
                },
            )
            .await
            .unwrap();
        assert_eq!(issued.record.user_id, signup.user.id());
        assert_eq!(issued.record.session_create_reason, Some(SessionCreateReason::Login));

        let exchanged = oauth.exchange_code(&issued.code, Some(VERIFIER)).await.unwrap();
        assert_eq!(exchanged.principal.principal_user_id(), signup.user.id());
        assert_eq!(exchanged.principal.provider_type().code(), "oauth");

        // Both credentials now resolve to the one user
        let by_email = env
            .authenticate_process()
            .authenticate_with_login_id(&email("a@example.com"), PASSWORD)
            .await
            .unwrap();
        assert_eq!(by_email.principal_user_id(), signup.user.id());
        let again = oauth
            .authenticate_code(&info, None, LoginState::default())
            .await
            .unwrap();
        assert_eq!(again.record.principal_id, exchanged.principal.principal_id());

        let completed = env
            .session_provider()
            .begin_session(
                "web",
                &exchanged.record.user_id,
                &exchanged.principal,
                SessionCreateReason::Login,
            )
            .await
            .unwrap();
        assert!(
            env.session_provider()
                .step_session(&completed)
                .await
                .unwrap()
                .is_completed()
        );
    }

    #[tokio::test]
    async fn test_new_federated_user_is_signed_up() {
        let env = TestEnv::new();
        let oauth = env.oauth_coordinator();

        let issued = oauth
            .authenticate_code(
                &google_info("sub-1", Some("new@example.com")),
                None,
                LoginState::default(),
            )
            .await
            .unwrap();

        assert_eq!(issued.record.session_create_reason, Some(SessionCreateReason::Signup));
        assert_eq!(env.store.user_count(), 1);
        assert_eq!(env.hooks.event_names(), vec!["user.create"]);
    }

    #[tokio::test]
    async fn test_code_exchanges_at_most_once() {
        let env = TestEnv::new();
        let oauth = env.oauth_coordinator();
        let issued = oauth
            .authenticate_code(&google_info("sub-1", None), None, LoginState::default())
            .await
            .unwrap();

        oauth.exchange_code(&issued.code, None).await.unwrap();
        assert!(matches!(
            oauth.exchange_code(&issued.code, None).await,
            Err(AuthnError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_wrong_verifier_spends_the_code() {
        let env = TestEnv::new();
        let oauth = env.oauth_coordinator();
        let issued = oauth
            .authenticate_code(
                &google_info("sub-1", None),
                Some(pkce_s256_challenge(VERIFIER)),
                LoginState::default(),
            )
            .await
            .unwrap();

        assert!(matches!(
            oauth.exchange_code(&issued.code, Some("wrong")).await,
            Err(AuthnError::InvalidCredentials)
        ));
        assert!(matches!(
            oauth.exchange_code(&issued.code, Some(VERIFIER)).await,
            Err(AuthnError::NotFound)
        ));
    }
}
