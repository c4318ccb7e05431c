use std::fmt;

use serde::{Serialize, Serializer};
use time::OffsetDateTime;

pub type EntityId = u64;
pub type UserId = u64;

/// Publication state of an entity.
///
/// Unknown keys are preserved as [`Status::Other`] so stores can define
/// their own states.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Publish => "publish",
            Status::Future => "future",
            Status::Draft => "draft",
            Status::Pending => "pending",
            Status::Private => "private",
            Status::Trash => "trash",
            Status::Other(key) => key,
        }
    }

    pub fn is_trashed(&self) -> bool {
        matches!(self, Status::Trash)
    }

    /// Published and private entities both count as published content.
    pub fn is_published(&self) -> bool {
        matches!(self, Status::Publish | Status::Private)
    }
}

impl From<&str> for Status {
    fn from(key: &str) -> Self {
        match key {
            "publish" => Status::Publish,
            "future" => Status::Future,
            "draft" => Status::Draft,
            "pending" => Status::Pending,
            "private" => Status::Private,
            "trash" => Status::Trash,
            other => Status::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: String,
    pub title: String,
    pub content: String,
    pub status: Status,
    pub author: UserId,
    pub slug: String,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
    /// Status held before the entity was moved to the trash.
    pub trashed_from: Option<Status>,
}

impl Entity {
    pub fn is_type(&self, entity_type: &str) -> bool {
        self.entity_type == entity_type
    }
}

/// Fields supplied when inserting a document. The store assigns id, slug and timestamps.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub entity_type: String,
    pub title: String,
    pub content: String,
    pub status: Status,
    pub author: UserId,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<Status>,
}
