//! Entity Module

pub mod anonymous_principal;
pub mod authenticator;
pub mod authn_session;
pub mod authorization_code;
pub mod custom_token_principal;
pub mod event;
pub mod identity;
pub mod oauth_principal;
pub mod password_principal;
pub mod principal;
pub mod session;
pub mod task;
pub mod user;
