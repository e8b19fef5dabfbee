//! Iteration lifecycle.
//!
//! ```text
//!   new ──► start ◄──► close
//!    └────────────────►  ▲
//! ```
//!
//! Every transition is allowed and re-entering the current state is a no-op.
//! Entering `start` is guarded: the root iteration can never be started, and
//! only one iteration per space may be started at a time. Starting one does
//! not close the other; the caller has to close it first.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Iteration, IterationState, UpdateIterationInput};

/// Check that `iteration` may move to `target`.
///
/// `started_elsewhere` is the id of another started iteration in the same
/// space, if the caller found one.
pub fn check_transition(
    iteration: &Iteration,
    target: IterationState,
    started_elsewhere: Option<Uuid>,
) -> Result<()> {
    if iteration.state == target || target != IterationState::Start {
        return Ok(());
    }

    if iteration.node.is_root() {
        return Err(Error::forbidden(format!(
            "Iteration {} is the root iteration of its space and cannot be started",
            iteration.node.id
        )));
    }

    if let Some(other) = started_elsewhere {
        return Err(Error::conflict(format!(
            "Iteration {} is already started in space {}; close it before starting {}",
            other, iteration.node.space_id, iteration.node.id
        )));
    }

    Ok(())
}

/// Whether applying `input` would move the iteration into `start`.
pub fn starts(iteration: &Iteration, input: &UpdateIterationInput) -> bool {
    input.state == Some(IterationState::Start) && iteration.state != IterationState::Start
}

/// Apply a partial update to an iteration. Fields absent from `input` keep
/// their current values; `Some(None)` clears a nullable field.
pub fn apply_update(mut iteration: Iteration, input: UpdateIterationInput) -> Result<Iteration> {
    if let Some(expected) = input.version {
        if expected != iteration.node.version {
            return Err(Error::conflict(format!(
                "Iteration {} has version {}, update was based on version {}",
                iteration.node.id, iteration.node.version, expected
            )));
        }
    }
    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(Error::bad_parameter("Iteration name must not be empty"));
        }
        iteration.node.name = name;
    }
    if let Some(description) = input.description {
        iteration.description = description;
    }
    if let Some(start_at) = input.start_at {
        iteration.start_at = start_at;
    }
    if let Some(end_at) = input.end_at {
        iteration.end_at = end_at;
    }
    if let Some(state) = input.state {
        iteration.state = state;
    }
    if let Some(user_active) = input.user_active {
        iteration.user_active = user_active;
    }
    Ok(iteration)
}
