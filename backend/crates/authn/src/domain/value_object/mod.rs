//! Value Object Module

pub mod claims;
pub mod email;
pub mod ids;
pub mod login_id;
pub mod on_user_duplicate;
pub mod provider_type;
pub mod session_step;
pub mod validation;
