//! Coordination of cached and background analysis runs.
//!
//! The [`AnalysisCoordinator`] glues the result cache, the task registry,
//! and a fingerprint→task index behind one mutex, so the check-then-act
//! decision for a submission is atomic: two callers can never both observe
//! "no cached value, no running task" and start duplicate work. The lock is
//! only held for that decision and for the final write-back — never across
//! a `compute` closure.
//!
//! ```text
//! submit_async(ns, params, compute)
//!   ├─ cached?            → (task_id, completed)      reuse or mint task id
//!   ├─ indexed & running? → (task_id, running)        coalesced, no new work
//!   ├─ indexed & done?    → (task_id, completed)
//!   └─ else               → (task_id, running) + spawn_blocking(compute)
//! ```

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::cache::{ResultCache, key};
use crate::error::AnalysisError;
use crate::tasks::{Task, TaskRegistry, TaskStatus};

/// Handle returned by [`AnalysisCoordinator::submit_async`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub task_id: String,
    pub status: TaskStatus,
}

/// Everything the decision phase needs to see atomically.
#[derive(Debug, Default)]
struct CoordinatorState {
    cache: ResultCache,
    tasks: TaskRegistry,
    /// Fingerprint → task id, so identical concurrent submissions coalesce
    /// onto one execution.
    index: HashMap<String, String>,
}

/// Process-wide coordinator for memoized and background analysis runs.
///
/// Construct one per process (or one per test) and hand clones to the HTTP
/// layer — clones share the same underlying state.
#[derive(Clone, Debug, Default)]
pub struct AnalysisCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
}

impl AnalysisCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous memoized call.
    ///
    /// On a cache hit, returns the stored value without invoking `compute`.
    /// Otherwise runs `compute` on the calling context (callers needing
    /// non-blocking behavior dispatch this to the blocking pool themselves),
    /// stores the result, and returns it. A failing `compute` propagates and
    /// caches nothing, so the next call retries from scratch.
    ///
    /// This primitive does not deduplicate concurrent first-time callers —
    /// use [`submit_async`](Self::submit_async) for expensive work.
    pub fn run_cached<P, F>(
        &self,
        namespace: &str,
        params: &P,
        compute: F,
    ) -> Result<Value, AnalysisError>
    where
        P: Serialize,
        F: FnOnce() -> Result<Value, AnalysisError>,
    {
        let fingerprint = key::cache_key(namespace, params)?;
        {
            let mut state = self.state.lock().unwrap();
            if let Some(value) = state.cache.get(&fingerprint) {
                debug!(namespace, %fingerprint, "cache hit");
                return Ok(value.clone());
            }
        }

        // Lock released while computing.
        let value = compute()?;

        let mut state = self.state.lock().unwrap();
        state.cache.insert(fingerprint, value.clone());
        Ok(value)
    }

    /// Submit a background analysis, coalescing identical submissions.
    ///
    /// Returns immediately with a task handle reflecting true state:
    /// `completed` when the result is already cached, `running` when an
    /// execution for the same fingerprint is in flight or freshly started.
    /// At most one execution per fingerprint is ever running; a previous
    /// failure does not poison the fingerprint — the next submission starts
    /// a fresh execution.
    ///
    /// Must be called within a Tokio runtime: `compute` runs on the
    /// blocking pool.
    pub fn submit_async<P, F>(
        &self,
        namespace: &str,
        params: &P,
        compute: F,
    ) -> Result<Submission, AnalysisError>
    where
        P: Serialize,
        F: FnOnce() -> Result<Value, AnalysisError> + Send + 'static,
    {
        let fingerprint = key::cache_key(namespace, params)?;
        let task_id = {
            let mut state = self.state.lock().unwrap();

            // Already computed: reuse the fingerprint's task, or mint a
            // bookkeeping task when the cache was warmed by a synchronous
            // call that never had one. No re-execution happens here.
            if let Some(value) = state.cache.get(&fingerprint).cloned() {
                let task_id = match state.index.get(&fingerprint) {
                    Some(id) => id.clone(),
                    None => {
                        let id = state.tasks.create();
                        state.index.insert(fingerprint.clone(), id.clone());
                        id
                    }
                };
                state.tasks.complete(&task_id, value);
                debug!(namespace, %task_id, "submission satisfied from cache");
                return Ok(Submission {
                    task_id,
                    status: TaskStatus::Completed,
                });
            }

            // In flight or already tracked: coalesce onto the existing task.
            // A Failed mapping falls through and a fresh execution starts.
            if let Some(existing) = state.index.get(&fingerprint).cloned()
                && let Some(task) = state.tasks.get(&existing)
                && task.status != TaskStatus::Failed
            {
                debug!(namespace, task_id = %existing, status = ?task.status,
                    "submission coalesced onto existing task");
                return Ok(Submission {
                    task_id: existing,
                    status: task.status,
                });
            }

            let task_id = state.tasks.create();
            state.index.insert(fingerprint.clone(), task_id.clone());
            task_id
        };

        info!(namespace, %task_id, "starting background analysis");
        let state = Arc::clone(&self.state);
        let bg_task_id = task_id.clone();
        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(compute).await;
            let mut state = state.lock().unwrap();
            match outcome {
                Ok(Ok(value)) => {
                    state.cache.insert(fingerprint, value.clone());
                    state.tasks.complete(&bg_task_id, value);
                    info!(task_id = %bg_task_id, "background analysis completed");
                }
                Ok(Err(err)) => {
                    // Failure is recorded on the task but never cached, so a
                    // retry with the same parameters re-runs the analysis.
                    warn!(task_id = %bg_task_id, error = %err, "background analysis failed");
                    state.tasks.fail(&bg_task_id, err.to_string());
                }
                Err(join_err) => {
                    warn!(task_id = %bg_task_id, error = %join_err, "analysis worker panicked");
                    state
                        .tasks
                        .fail(&bg_task_id, format!("analysis worker panicked: {join_err}"));
                }
            }
        });

        Ok(Submission {
            task_id,
            status: TaskStatus::Running,
        })
    }

    /// Snapshot of a task's current state. `None` for unknown ids.
    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.state.lock().unwrap().tasks.get(task_id)
    }

    /// Whether a result is already cached for `(namespace, params)`.
    pub fn is_cached<P: Serialize>(
        &self,
        namespace: &str,
        params: &P,
    ) -> Result<bool, AnalysisError> {
        let fingerprint = key::cache_key(namespace, params)?;
        Ok(self.state.lock().unwrap().cache.contains(&fingerprint))
    }
}
