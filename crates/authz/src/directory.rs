use std::collections::HashMap;

use folio_kernel::settings::PrincipalEntry;
use thiserror::Error;

use crate::capability::Role;
use crate::principal::Principal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("principal {user_id} has an empty token")]
    EmptyToken { user_id: u64 },

    #[error("principal {user_id} uses reserved user id 0")]
    ReservedUserId { user_id: u64 },

    #[error("principal {user_id}: {reason}")]
    InvalidRole { user_id: u64, reason: String },

    #[error("token of principal {user_id} is already assigned")]
    DuplicateToken { user_id: u64 },
}

/// Bearer-token lookup of configured principals.
#[derive(Debug, Clone, Default)]
pub struct PrincipalDirectory {
    by_token: HashMap<String, Principal>,
}

impl PrincipalDirectory {
    pub fn from_entries(entries: &[PrincipalEntry]) -> Result<Self, DirectoryError> {
        let mut by_token = HashMap::with_capacity(entries.len());

        for entry in entries {
            let user_id = entry.user_id;
            if entry.token.trim().is_empty() {
                return Err(DirectoryError::EmptyToken { user_id });
            }
            if user_id == 0 {
                return Err(DirectoryError::ReservedUserId { user_id });
            }
            let role: Role = entry
                .role
                .parse()
                .map_err(|reason| DirectoryError::InvalidRole { user_id, reason })?;

            let principal = Principal {
                user_id,
                role: Some(role),
                display_name: entry.display_name.clone(),
            };
            if by_token.insert(entry.token.clone(), principal).is_some() {
                return Err(DirectoryError::DuplicateToken { user_id });
            }
        }

        Ok(Self { by_token })
    }

    pub fn resolve(&self, token: &str) -> Option<&Principal> {
        self.by_token.get(token)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(token: &str, user_id: u64, role: &str) -> PrincipalEntry {
        PrincipalEntry {
            token: token.to_string(),
            user_id,
            role: role.to_string(),
            display_name: None,
        }
    }

    #[test]
    fn resolves_configured_tokens() {
        let directory =
            PrincipalDirectory::from_entries(&[entry("t-editor", 2, "editor")]).unwrap();
        let principal = directory.resolve("t-editor").unwrap();
        assert_eq!(principal.user_id, 2);
        assert_eq!(principal.role, Some(Role::Editor));
        assert!(directory.resolve("nope").is_none());
    }

    #[test]
    fn rejects_bad_entries() {
        assert_eq!(
            PrincipalDirectory::from_entries(&[entry(" ", 2, "editor")]).unwrap_err(),
            DirectoryError::EmptyToken { user_id: 2 }
        );
        assert_eq!(
            PrincipalDirectory::from_entries(&[entry("t", 0, "editor")]).unwrap_err(),
            DirectoryError::ReservedUserId { user_id: 0 }
        );
        assert!(matches!(
            PrincipalDirectory::from_entries(&[entry("t", 2, "owner")]),
            Err(DirectoryError::InvalidRole { .. })
        ));
        assert_eq!(
            PrincipalDirectory::from_entries(&[entry("t", 2, "editor"), entry("t", 3, "author")])
                .unwrap_err(),
            DirectoryError::DuplicateToken { user_id: 3 }
        );
    }
}
