//! Convenience re-exports for service code.
//!
//! ```ignore
//! use windrose::prelude::*;
//!
//! let coordinator = AnalysisCoordinator::new();
//! let loader = PlantLoader::new();
//! ```

pub use crate::cache::key::cache_key;
pub use crate::coordinator::{AnalysisCoordinator, Submission};
pub use crate::error::AnalysisError;
pub use crate::plant::{PlantData, PlantLoader};
pub use crate::tasks::{Task, TaskStatus};
