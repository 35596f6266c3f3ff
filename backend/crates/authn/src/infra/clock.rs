//! Wall clock

use chrono::{DateTime, Utc};

use crate::domain::services::TimeProvider;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
