//! Wind-plant analytics core: result caching, asynchronous task coordination,
//! and the shared plant dataset.
//!
//! `windrose` is the library behind the `windrose-web` HTTP service. Analyses
//! themselves (power-curve fitting, loss estimation, AEP) are opaque to this
//! crate — callers hand in `compute` closures, and the core decides whether
//! to run them, reuse a cached result, or attach the caller to an execution
//! that is already in flight.
//!
//! # Architecture
//!
//! ```text
//! HTTP handler ──params──▶ AnalysisCoordinator ──▶ ResultCache
//!                               │                  TaskRegistry
//!                               │                  fingerprint → task index
//!                               └──spawn_blocking──▶ compute()
//! ```
//!
//! The coordinator owns all three structures behind a single mutex so that
//! the check-then-act decision ("cached? running? start fresh?") is atomic.
//! The lock is never held while a `compute` closure runs.
//!
//! # Where to find things
//!
//! - **Fingerprinting:** [`cache::key::cache_key`] builds a deterministic
//!   `namespace:sha256` fingerprint from any serializable parameter set.
//! - **Synchronous memoization:** [`AnalysisCoordinator::run_cached`] — runs
//!   `compute` on the calling context, caches on success.
//! - **Background submission:** [`AnalysisCoordinator::submit_async`] —
//!   at-most-one execution per fingerprint, returns a task handle
//!   immediately.
//! - **Polling:** [`AnalysisCoordinator::get_task`] returns a snapshot of a
//!   [`Task`](tasks::Task); terminal states are final.
//! - **The dataset:** [`plant::PlantLoader`] lazily initializes the shared
//!   [`PlantData`](plant::PlantData) exactly once and hands the same `Arc` to
//!   every caller.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod plant;
pub mod prelude;
pub mod tasks;

pub use coordinator::{AnalysisCoordinator, Submission};
pub use error::AnalysisError;
