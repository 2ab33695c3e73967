//! Mutator-based reconciliation for Gantry
//!
//! Desired objects are never applied as-is. Each one is merged into the live
//! object (or a scaffold when absent) by the mutator registered for its kind,
//! and written back only when the merge changed something. Fields a mutator
//! does not own survive untouched, so autoscalers, admission webhooks and
//! humans can share the same objects.

#![deny(missing_docs)]

pub mod driver;
pub mod error;
pub mod mutator;
pub mod registry;
pub mod store;

pub use driver::{ObjectReport, Outcome, ReconcileReport, Reconciler, ReconcilerConfig};
pub use error::ReconcileError;
pub use mutator::Mutator;
pub use registry::MutatorRegistry;
pub use store::{KubeObjectStore, ObjectStore};

/// Result type alias for reconciliation
pub type Result<T> = std::result::Result<T, ReconcileError>;
