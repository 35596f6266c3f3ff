//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod config;
mod hooks;
pub mod identity_provider;
pub mod oauth;
pub mod result;
pub mod session;
pub mod session_token;
pub mod sign_up;
pub mod tasks;

// Re-exports
pub use authenticate::AuthenticateProcess;
pub use config::AuthnConfig;
pub use identity_provider::IdentityProviderAggregator;
pub use oauth::{ExchangedCode, IssuedCode, OAuthCoordinator};
pub use result::{CompletionResult, InProgressResult, StepResult};
pub use session::{MfaCase, SessionProvider};
pub use session_token::AuthnSessionTokenCodec;
pub use sign_up::{SignupOutput, SignupProcess};
pub use tasks::enqueue_tasks;
