//! Error taxonomy for the analytics core.
//!
//! Nothing here is fatal to the process: parameter errors surface to the
//! caller before any work starts, compute failures either propagate (sync)
//! or are captured into Failed task state (async), and unknown task ids are
//! an ordinary not-found condition.

use thiserror::Error;

/// Errors produced by the caching and task-coordination core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The analysis parameters could not be canonically serialized for
    /// fingerprinting. Raised before any computation starts.
    #[error("invalid analysis parameters: {0}")]
    InvalidParameters(String),

    /// The supplied `compute` closure failed. For synchronous calls this
    /// propagates to the caller and nothing is cached; for async tasks it is
    /// recorded as the task's error.
    #[error("analysis computation failed: {0}")]
    Compute(String),

    /// No task with the given id exists.
    #[error("no task with id {0}")]
    TaskNotFound(String),
}
