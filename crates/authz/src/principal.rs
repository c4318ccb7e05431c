use folio_db::UserId;

use crate::capability::{Capability, Role};

/// The identity a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// `0` for anonymous callers.
    pub user_id: UserId,
    pub role: Option<Role>,
    pub display_name: Option<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            user_id: 0,
            role: None,
            display_name: None,
        }
    }

    pub fn user(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role: Some(role),
            display_name: None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id == 0
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.role.is_some_and(|role| role.has(capability))
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}
