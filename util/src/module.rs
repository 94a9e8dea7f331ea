//! Command interfaces
//!
//! Every command driven by an executable's fixed-period loop shall implement
//! the items in this module.

// ---------------------------------------------------------------------------
// COMMAND LIFECYCLE
// ---------------------------------------------------------------------------

/// A command scheduled by an external cyclic loop.
///
/// The loop guarantees that none of these functions are called concurrently
/// and that none of them overlap, so implementations can hold plain mutable
/// state. None of them may block.
pub trait Command {
    /// A report on the status of one cycle of processing.
    type StatusReport;
    /// An error which can occur when the lifecycle is driven out of order.
    type Error;

    /// Activate the command.
    ///
    /// # Outputs
    /// - On success `Ok(())`.
    /// - On error an `Error` instance, in which case no side effects have
    ///   taken place.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Main cyclic processing function, called once per cycle while active.
    ///
    /// # Outputs
    /// - On success the status report for this cycle.
    /// - On error an `Error` instance.
    fn execute(&mut self) -> Result<Self::StatusReport, Self::Error>;

    /// Deactivate the command.
    ///
    /// `interrupted` is true if the command was cancelled rather than
    /// finishing on its own. Cleanup must run in both cases, which is why
    /// this function cannot fail.
    fn end(&mut self, interrupted: bool);

    /// Whether the command has finished on its own. Commands whose duration
    /// is controlled entirely by the loop never finish.
    fn is_finished(&self) -> bool {
        false
    }
}
