//! Background task hand-off

use crate::domain::entity::task::Task;
use crate::domain::services::TaskQueue;

/// Enqueue `tasks` in order. Failures are logged and skipped; the operation
/// that produced the tasks has already succeeded.
pub fn enqueue_tasks(queue: &dyn TaskQueue, tasks: Vec<Task>) {
    for task in tasks {
        let name = task.name();
        if let Err(e) = queue.enqueue(task) {
            tracing::error!(task = name, error = %e, "Failed to enqueue task");
        }
    }
}
