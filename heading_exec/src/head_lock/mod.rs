//! # Heading lock module
//!
//! The heading lock command keeps the rover pointed at a target seen by the
//! vision sensor while the driver keeps control of translation. Each cycle it
//! reads the bearing to the target, runs it through the profiled heading
//! controller and sends the resulting angular rate to the drivetrain
//! alongside the driver's x/y velocity demands.
//!
//! The command is driven through the `util::module::Command` lifecycle:
//!
//! ```text
//!            initialize              end
//! Inactive -------------> Active ----------> Terminating --> Inactive
//!                         |    ^             (lights off)
//!                         +----+
//!                         execute
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod eqpt;
mod params;
mod state;
mod tunables;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use eqpt::*;
pub use params::*;
pub use state::*;
pub use tunables::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during HeadingLock operation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HeadingLockError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Cannot {event} while {state:?}")]
    InvalidTransition {
        state: LockState,
        event: &'static str
    },

    #[error("The heading lock is not active")]
    NotActive
}
