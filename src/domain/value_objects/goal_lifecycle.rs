use thiserror::Error;

use super::enums::{goal_statuses::GoalStatus, payment_statuses::Settlement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalAction {
    Assign,
    Start,
    Complete,
    Fail,
}

impl GoalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalAction::Assign => "assign",
            GoalAction::Start => "start",
            GoalAction::Complete => "complete",
            GoalAction::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {} a goal in status {from}", .action.as_str())]
pub struct InvalidTransition {
    pub from: GoalStatus,
    pub action: GoalAction,
}

impl GoalStatus {
    /// Forward-only transition table. Every pair not listed is rejected.
    pub fn apply(self, action: GoalAction) -> Result<GoalStatus, InvalidTransition> {
        match (self, action) {
            (GoalStatus::PendingInstructorAssignment, GoalAction::Assign) => {
                Ok(GoalStatus::Assigned)
            }
            (GoalStatus::Assigned, GoalAction::Start) => Ok(GoalStatus::Active),
            (GoalStatus::Active, GoalAction::Complete) => Ok(GoalStatus::Completed),
            (GoalStatus::Active, GoalAction::Fail) => Ok(GoalStatus::Failed),
            (
                GoalStatus::PendingInstructorAssignment
                | GoalStatus::Assigned
                | GoalStatus::Active
                | GoalStatus::Completed
                | GoalStatus::Failed,
                _,
            ) => Err(InvalidTransition { from: self, action }),
        }
    }
}

/// Terminal result an instructor records for an active goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    Completed,
    Failed,
}

impl GoalOutcome {
    pub fn from_status(status: GoalStatus) -> Option<Self> {
        match status {
            GoalStatus::Completed => Some(GoalOutcome::Completed),
            GoalStatus::Failed => Some(GoalOutcome::Failed),
            GoalStatus::PendingInstructorAssignment
            | GoalStatus::Assigned
            | GoalStatus::Active => None,
        }
    }

    pub fn action(&self) -> GoalAction {
        match self {
            GoalOutcome::Completed => GoalAction::Complete,
            GoalOutcome::Failed => GoalAction::Fail,
        }
    }

    /// A completed goal gets its stake back; a failed one forfeits it.
    pub fn settlement(&self) -> Settlement {
        match self {
            GoalOutcome::Completed => Settlement::Refund,
            GoalOutcome::Failed => Settlement::Capture,
        }
    }

    pub fn status(&self) -> GoalStatus {
        match self {
            GoalOutcome::Completed => GoalStatus::Completed,
            GoalOutcome::Failed => GoalStatus::Failed,
        }
    }
}
