//! Background tasks produced by signup
//!
//! Returned to the caller and enqueued after the operation succeeds.

use serde::{Deserialize, Serialize};

use crate::domain::value_object::{ids::UserId, login_id::LoginId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "param", rename_all = "snake_case")]
pub enum Task {
    WelcomeEmail { user_id: UserId, email: String },
    VerifyCode { user_id: UserId, login_id: LoginId },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::WelcomeEmail { .. } => "welcome_email",
            Task::VerifyCode { .. } => "verify_code",
        }
    }
}
