//! Infrastructure Layer
//!
//! Store, checker, clock and queue implementations.

pub mod clock;
pub mod login_id_checker;
pub mod memory;
pub mod password_checker;
pub mod task_queue;

pub use clock::SystemTimeProvider;
pub use login_id_checker::{DefaultLoginIdChecker, LoginIdKeyConfig};
pub use memory::InMemoryStore;
pub use password_checker::PolicyPasswordChecker;
pub use task_queue::TracingTaskQueue;
