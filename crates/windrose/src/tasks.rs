//! Registry for long-running analysis tasks.
//!
//! Tasks are created in `Running` state and transition exactly once to
//! `Completed` (with a result) or `Failed` (with an error message). Terminal
//! states are final — a late `complete` or `fail` on an already-terminal
//! task is ignored rather than corrupting state. There is no cancellation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle state of an analysis task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether no further transition can occur from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// A tracked analysis run, as seen by polling clients.
#[derive(Clone, Debug, Serialize)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    /// Present once the task is `Completed`.
    pub result: Option<Value>,
    /// Present once the task is `Failed`.
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory task registry.
///
/// Not internally synchronized — lives inside the coordinator mutex. Task
/// ids are UUIDv4, so they never collide with previously issued ids for the
/// life of the process.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh task id and insert a `Running` task for it.
    pub fn create(&mut self) -> String {
        let task_id = Uuid::new_v4().to_string();
        self.tasks.insert(
            task_id.clone(),
            Task {
                task_id: task_id.clone(),
                status: TaskStatus::Running,
                result: None,
                error: None,
                updated_at: Utc::now(),
            },
        );
        task_id
    }

    /// Snapshot of a task's current state. `None` for unknown ids.
    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.get(task_id).cloned()
    }

    /// Transition a `Running` task to `Completed` with its result.
    ///
    /// Ignored for unknown ids and for tasks already in a terminal state.
    pub fn complete(&mut self, task_id: &str, result: Value) {
        self.transition(task_id, TaskStatus::Completed, Some(result), None);
    }

    /// Transition a `Running` task to `Failed` with an error message.
    ///
    /// Ignored for unknown ids and for tasks already in a terminal state.
    pub fn fail(&mut self, task_id: &str, error: impl Into<String>) {
        self.transition(task_id, TaskStatus::Failed, None, Some(error.into()));
    }

    /// Number of tracked tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks have been created yet.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn transition(
        &mut self,
        task_id: &str,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) {
        let Some(task) = self.tasks.get_mut(task_id) else {
            debug!(task_id, "transition for unknown task ignored");
            return;
        };
        if task.status.is_terminal() {
            debug!(task_id, ?status, "transition on terminal task ignored");
            return;
        }
        task.status = status;
        task.result = result;
        task.error = error;
        task.updated_at = Utc::now();
    }
}
