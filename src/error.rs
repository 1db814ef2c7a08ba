//! Error kinds for the schedule, routing table and rule engine (§7).
//!
//! No error propagates across the whole simulation: every variant here
//! is either logged and the faulting mutation skipped (`InvalidTimeslot`,
//! `UnknownRule`), returned to the caller to decide (`MissingParent`), or
//! an assertion-class contract violation the caller is expected to avoid
//! by checking first (`DuplicateRoute`).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreError {
    /// A rule asked to install a cell outside its slotframe's bounds.
    #[error("timeslot {timeslot} out of range for slotframe {handle} of size {size}")]
    InvalidTimeslot {
        handle: u16,
        timeslot: u16,
        size: u16,
    },

    /// `add_route` was invoked for a destination that already has a route.
    #[error("route for destination {dst} already exists")]
    DuplicateRoute { dst: u16 },

    /// A rule name in `OrchestraRules` is not a registered rule.
    #[error("unknown Orchestra rule {name:?}")]
    UnknownRule { name: String },

    /// Neither a specific route nor a default route covers a destination.
    #[error("no route (and no default route) for destination {dst}")]
    MissingParent { dst: u16 },
}
