use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    PendingInstructorAssignment,
    Assigned,
    Active,
    Completed,
    Failed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::PendingInstructorAssignment => "PENDING_INSTRUCTOR_ASSIGNMENT",
            GoalStatus::Assigned => "ASSIGNED",
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Completed => "COMPLETED",
            GoalStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PENDING_INSTRUCTOR_ASSIGNMENT" => Some(GoalStatus::PendingInstructorAssignment),
            "ASSIGNED" => Some(GoalStatus::Assigned),
            "ACTIVE" => Some(GoalStatus::Active),
            "COMPLETED" => Some(GoalStatus::Completed),
            "FAILED" => Some(GoalStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::Failed)
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
