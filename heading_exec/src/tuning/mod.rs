//! # Tuning module
//!
//! Live-tunable values which external operators can edit while the control
//! loop is running. Tunables are held in a [`TuningRegistry`] which is
//! created once per process and handed explicitly to whoever needs it, the
//! writer being some external tuning collaborator and the readers being the
//! commands which poll for changes each cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod gains;
mod registry;
mod tunable;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use gains::*;
pub use registry::*;
pub use tunable::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when accessing the tuning registry.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TuningError {
    #[error("No tunable named \"{0}\" is registered")]
    NotFound(String),

    #[error("Tunable \"{name}\" is registered with a different type than {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str
    }
}
