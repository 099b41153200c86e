//! Assignment status workflow
//!
//! Status flow: new → process → assign → approve → finish, with complete,
//! update_fms, and cancel as settable terminal states. Which actions are
//! valid from a given status depends on the category kind:
//!
//! - Sub:  new →(Receive)→ process →(Assign)→ assign →(Approve)→ approve
//!   →(Finish)→ finish
//! - Plan: new →(Receive)→ process, new →(Cancel)→ cancel,
//!   process →(Complete)→ complete (forces progress_percent to 100)
//! - Plain: no actions

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::category::CategoryKind;

/// Assignment status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    Process,
    Assign,
    Approve,
    Finish,
    Complete,
    UpdateFms,
    Cancel,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::New,
        Status::Process,
        Status::Assign,
        Status::Approve,
        Status::Finish,
        Status::Complete,
        Status::UpdateFms,
        Status::Cancel,
    ];

    /// Check if no workflow action leads out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Finish | Status::Complete | Status::UpdateFms | Status::Cancel
        )
    }

    /// Label shown in tables and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Status::New => "New Job",
            Status::Process => "Inprocess",
            Status::Assign => "Assign",
            Status::Approve => "Approve",
            Status::Finish => "Finish",
            Status::Complete => "Complete",
            Status::UpdateFms => "Update FMS",
            Status::Cancel => "Cancel",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Process => "process",
            Status::Assign => "assign",
            Status::Approve => "approve",
            Status::Finish => "finish",
            Status::Complete => "complete",
            Status::UpdateFms => "update_fms",
            Status::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// User-triggered workflow actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Receive,
    Assign,
    Approve,
    Finish,
    Complete,
    Cancel,
}

impl WorkflowAction {
    fn slug(&self) -> &'static str {
        match self {
            WorkflowAction::Receive => "receive",
            WorkflowAction::Assign => "assign",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Finish => "finish",
            WorkflowAction::Complete => "complete",
            WorkflowAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Errors for workflow operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("action {action} is not valid from status {from} in the {kind} workflow")]
    InvalidTransition {
        from: Status,
        action: WorkflowAction,
        kind: CategoryKind,
    },

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl std::str::FromStr for Status {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.slug() == s)
            .ok_or_else(|| WorkflowError::UnknownStatus(s.to_string()))
    }
}

impl std::str::FromStr for WorkflowAction {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            WorkflowAction::Receive,
            WorkflowAction::Assign,
            WorkflowAction::Approve,
            WorkflowAction::Finish,
            WorkflowAction::Complete,
            WorkflowAction::Cancel,
        ]
        .into_iter()
        .find(|action| action.slug() == s)
        .ok_or_else(|| WorkflowError::UnknownAction(s.to_string()))
    }
}

/// The outcome of a valid transition: the new status plus the extra fields
/// merged atomically with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEffect {
    pub status: Status,
    pub extra: Map<String, Value>,
}

impl TransitionEffect {
    fn to(status: Status) -> Self {
        Self {
            status,
            extra: Map::new(),
        }
    }

    fn with_extra(status: Status, key: &str, value: Value) -> Self {
        let mut extra = Map::new();
        extra.insert(key.to_string(), value);
        Self { status, extra }
    }
}

/// Actions offered from `status` in a `kind` workflow, in display order.
pub fn allowed_actions(status: Status, kind: CategoryKind) -> &'static [WorkflowAction] {
    match (kind, status) {
        (CategoryKind::Sub, Status::New) => &[WorkflowAction::Receive],
        (CategoryKind::Sub, Status::Process) => &[WorkflowAction::Assign],
        (CategoryKind::Sub, Status::Assign) => &[WorkflowAction::Approve],
        (CategoryKind::Sub, Status::Approve) => &[WorkflowAction::Finish],
        (CategoryKind::Plan, Status::New) => &[WorkflowAction::Receive, WorkflowAction::Cancel],
        (CategoryKind::Plan, Status::Process) => &[WorkflowAction::Complete],
        _ => &[],
    }
}

/// Validate and apply a workflow action.
///
/// Returns the transition effect or an error when the action is not in the
/// allowed set for the current status and category kind.
pub fn apply(
    status: Status,
    action: WorkflowAction,
    kind: CategoryKind,
) -> Result<TransitionEffect, WorkflowError> {
    let effect = match (kind, status, action) {
        (CategoryKind::Sub, Status::New, WorkflowAction::Receive) => {
            TransitionEffect::to(Status::Process)
        }
        (CategoryKind::Sub, Status::Process, WorkflowAction::Assign) => {
            TransitionEffect::to(Status::Assign)
        }
        (CategoryKind::Sub, Status::Assign, WorkflowAction::Approve) => {
            TransitionEffect::to(Status::Approve)
        }
        (CategoryKind::Sub, Status::Approve, WorkflowAction::Finish) => {
            TransitionEffect::to(Status::Finish)
        }
        (CategoryKind::Plan, Status::New, WorkflowAction::Receive) => {
            TransitionEffect::to(Status::Process)
        }
        (CategoryKind::Plan, Status::New, WorkflowAction::Cancel) => {
            TransitionEffect::to(Status::Cancel)
        }
        (CategoryKind::Plan, Status::Process, WorkflowAction::Complete) => {
            TransitionEffect::with_extra(Status::Complete, "progress_percent", json!(100))
        }
        _ => {
            return Err(WorkflowError::InvalidTransition {
                from: status,
                action,
                kind,
            })
        }
    };
    Ok(effect)
}
