//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary shared by every crate in the workspace:
//! - the [`error::app_error::AppError`] type the outer layers render
//! - the [`error::kind::ErrorKind`] classification
//! - typed identifiers ([`id::Id`])
//!
//! Only things whose meaning is identical in every bounded context belong here.

pub mod error {
    pub mod app_error;
    pub mod kind;
}
pub mod id;
