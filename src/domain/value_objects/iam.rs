use thiserror::Error;
use uuid::Uuid;

use super::enums::roles::{Capability, Role};

/// Caller identity handed to every use case for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("role {role} may not {capability:?}")]
pub struct MissingCapability {
    pub role: Role,
    pub capability: Capability,
}

impl RequestContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            email: None,
            name: None,
            role,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), MissingCapability> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(MissingCapability {
                role: self.role,
                capability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_the_missing_capability() {
        let ctx = RequestContext::new(Uuid::new_v4(), Role::Student);
        let err = ctx.require(Capability::Instruct).unwrap_err();
        assert_eq!(err.role, Role::Student);
        assert_eq!(err.capability, Capability::Instruct);
        assert!(ctx.require(Capability::ManageOwnGoals).is_ok());
    }
}
