use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DispatchError, DispatchResult};

/// Caller roles. Session establishment and credential checks belong to the
/// auth collaborator; by the time a role reaches this crate it is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Transportista,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Transportista => "transportista",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transportista" => Some(Role::Transportista),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Verified (user id, role) pair passed explicitly into every operation.
/// There is no ambient session state and no id-from-body fallback.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl CallerContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> DispatchResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DispatchError::Forbidden(
                "se requiere rol de administrador".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_round_trip() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("transportista"), Some(Role::Transportista));
        assert_eq!(Role::parse("ADMIN"), None);
    }

    #[test]
    fn test_require_admin_rejects_drivers() {
        let driver = CallerContext::new(Uuid::new_v4(), Role::Transportista);
        assert!(driver.require_admin().is_err());

        let admin = CallerContext::new(Uuid::new_v4(), Role::Admin);
        assert!(admin.require_admin().is_ok());
    }
}
