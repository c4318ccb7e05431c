use std::str::FromStr;

use serde::Serialize;

/// Primitive capabilities granted by roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    PublishPosts,
    EditPosts,
    EditOthersPosts,
    EditPublishedPosts,
    EditPrivatePosts,
    DeletePosts,
    DeleteOthersPosts,
    DeletePublishedPosts,
    DeletePrivatePosts,
}

use Capability::*;

const EDITOR_CAPS: &[Capability] = &[
    Read,
    PublishPosts,
    EditPosts,
    EditOthersPosts,
    EditPublishedPosts,
    EditPrivatePosts,
    DeletePosts,
    DeleteOthersPosts,
    DeletePublishedPosts,
    DeletePrivatePosts,
];

const AUTHOR_CAPS: &[Capability] = &[
    Read,
    PublishPosts,
    EditPosts,
    EditPublishedPosts,
    DeletePosts,
    DeletePublishedPosts,
];

const CONTRIBUTOR_CAPS: &[Capability] = &[Read, EditPosts, DeletePosts];

const SUBSCRIBER_CAPS: &[Capability] = &[Read];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Editor => "editor",
            Role::Author => "author",
            Role::Contributor => "contributor",
            Role::Subscriber => "subscriber",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Administrator | Role::Editor => EDITOR_CAPS,
            Role::Author => AUTHOR_CAPS,
            Role::Contributor => CONTRIBUTOR_CAPS,
            Role::Subscriber => SUBSCRIBER_CAPS,
        }
    }

    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "administrator" => Ok(Role::Administrator),
            "editor" => Ok(Role::Editor),
            "author" => Ok(Role::Author),
            "contributor" => Ok(Role::Contributor),
            "subscriber" => Ok(Role::Subscriber),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_table() {
        assert!(Role::Editor.has(EditOthersPosts));
        assert!(Role::Author.has(PublishPosts));
        assert!(!Role::Author.has(EditOthersPosts));
        assert!(!Role::Contributor.has(PublishPosts));
        assert!(!Role::Subscriber.has(EditPosts));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Editor".parse::<Role>().unwrap(), Role::Editor);
        assert!("owner".parse::<Role>().is_err());
    }
}
