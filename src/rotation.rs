//! Round-robin subcontractor allocation
//!
//! Each subcontractor category keeps a rotation state: a monotonically
//! advancing index and the description of the last job that consumed a slot.
//! Allocation is a pure function of the roster snapshot and the index; the
//! index advances by one per non-special job created, never otherwise.
//! Roster mutations do not reset indexes — the modulo absorbs the drift.

use serde::{Deserialize, Serialize};

use crate::category::SPECIAL_JOB;

/// Per-category rotation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    /// Absolute counter; selects `roster[index mod len]`
    pub index: u64,

    /// Description of the last job that advanced the rotation
    #[serde(default)]
    pub last_job: String,
}

/// What the operator sees before confirming a new job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPreview {
    /// The team that received the previous slot
    pub previous: String,
    /// The team this job will be assigned to
    pub current: String,
}

/// Compute the current and previous assignees for a roster snapshot.
///
/// Returns `None` for an empty roster: nothing can be assigned and no slot
/// is consumed.
pub fn preview(roster: &[String], state: &RotationState) -> Option<RotationPreview> {
    if roster.is_empty() {
        return None;
    }
    let len = roster.len() as u64;
    let current = (state.index % len) as usize;
    let previous = ((state.index + len - 1) % len) as usize;
    Some(RotationPreview {
        previous: roster[previous].clone(),
        current: roster[current].clone(),
    })
}

/// The state after a job consumed the current slot.
pub fn advanced(state: &RotationState, description: &str) -> RotationState {
    RotationState {
        index: state.index + 1,
        last_job: description.to_string(),
    }
}

/// Special jobs bypass rotation: no assignment, no slot consumed.
pub fn is_special(job_type: &str) -> bool {
    job_type == SPECIAL_JOB
}
