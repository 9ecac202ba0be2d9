//! Result caching for analysis runs.
//!
//! - [`key`] — deterministic fingerprints from `(namespace, params)`.
//! - [`store`] — the in-memory result store, keyed by fingerprint.
//!
//! The store itself is not synchronized; it lives inside the
//! [`AnalysisCoordinator`](crate::coordinator::AnalysisCoordinator) mutex
//! together with the task registry, so cache checks and task decisions are
//! one atomic step.

pub mod key;
pub mod store;

pub use key::cache_key;
pub use store::ResultCache;
