//! Policy-backed password checker

use platform::password::{ClearTextPassword, PasswordPolicy};

use crate::domain::services::PasswordChecker;
use crate::domain::value_object::validation::ValidationCause;
use crate::error::{AuthnError, AuthnResult};

pub struct PolicyPasswordChecker {
    policy: PasswordPolicy,
}

impl PolicyPasswordChecker {
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }
}

impl PasswordChecker for PolicyPasswordChecker {
    fn validate_password(&self, password: &ClearTextPassword) -> AuthnResult<()> {
        self.policy.check(password).map_err(|violations| {
            AuthnError::PasswordPolicyViolated(
                violations.into_iter().map(ValidationCause::from).collect(),
            )
        })
    }
}
