use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

/// What a caller is trying to do, checked against their role at each gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageOwnGoals,
    Instruct,
    Administer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Instructor => "INSTRUCTOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "STUDENT" => Some(Role::Student),
            "INSTRUCTOR" => Some(Role::Instructor),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Admin, _) => true,
            (Role::Instructor, Capability::ManageOwnGoals | Capability::Instruct) => true,
            (Role::Instructor, Capability::Administer) => false,
            (Role::Student, Capability::ManageOwnGoals) => true,
            (Role::Student, Capability::Instruct | Capability::Administer) => false,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
