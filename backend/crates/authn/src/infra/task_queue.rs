//! Task queue that only records tasks in the log
//!
//! Stand-in until a worker backend is wired up.

use crate::domain::entity::task::Task;
use crate::domain::services::TaskQueue;
use crate::error::AuthnResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTaskQueue;

impl TaskQueue for TracingTaskQueue {
    fn enqueue(&self, task: Task) -> AuthnResult<()> {
        let param = serde_json::to_string(&task)?;
        tracing::info!(task = task.name(), param = %param, "Task enqueued");
        Ok(())
    }
}
