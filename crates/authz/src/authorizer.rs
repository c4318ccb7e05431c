use std::sync::Arc;

use async_trait::async_trait;
use folio_db::{Entity, EntityId, EntityStore, Status, StoreError};

use crate::capability::Capability;
use crate::principal::Principal;

/// Per-operation authorization decisions.
#[async_trait]
pub trait Authorizer: Send + Sync {
    fn can_publish(&self, principal: &Principal) -> bool;

    async fn can_edit(&self, principal: &Principal, id: EntityId) -> Result<bool, StoreError>;

    async fn can_delete(&self, principal: &Principal, id: EntityId) -> Result<bool, StoreError>;
}

#[derive(Clone, Copy)]
enum Action {
    Edit,
    Delete,
}

impl Action {
    fn own(self) -> Capability {
        match self {
            Action::Edit => Capability::EditPosts,
            Action::Delete => Capability::DeletePosts,
        }
    }

    fn others(self) -> Capability {
        match self {
            Action::Edit => Capability::EditOthersPosts,
            Action::Delete => Capability::DeleteOthersPosts,
        }
    }

    fn published(self) -> Capability {
        match self {
            Action::Edit => Capability::EditPublishedPosts,
            Action::Delete => Capability::DeletePublishedPosts,
        }
    }

    fn private(self) -> Capability {
        match self {
            Action::Edit => Capability::EditPrivatePosts,
            Action::Delete => Capability::DeletePrivatePosts,
        }
    }
}

/// Primitive capabilities needed to act on `entity`.
///
/// A trashed entity is judged by the status it held before trashing.
fn required_capabilities(principal: &Principal, entity: &Entity, action: Action) -> Vec<Capability> {
    let status = match (&entity.status, &entity.trashed_from) {
        (Status::Trash, Some(previous)) => previous,
        (status, _) => status,
    };

    if !principal.is_anonymous() && principal.user_id == entity.author {
        return if status.is_published() {
            vec![action.published()]
        } else {
            vec![action.own()]
        };
    }

    let mut caps = vec![action.others()];
    match status {
        Status::Publish => caps.push(action.published()),
        Status::Private => caps.push(action.private()),
        _ => {}
    }
    caps
}

/// Role-based authorizer resolving ownership through the entity store.
pub struct CapabilityAuthorizer {
    store: Arc<dyn EntityStore>,
}

impl CapabilityAuthorizer {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    async fn check(
        &self,
        principal: &Principal,
        id: EntityId,
        action: Action,
    ) -> Result<bool, StoreError> {
        let Some(entity) = self.store.find(id).await? else {
            return Ok(false);
        };

        let allowed = required_capabilities(principal, &entity, action)
            .into_iter()
            .all(|capability| principal.has(capability));

        tracing::debug!(
            target: "folio-authz",
            user_id = principal.user_id,
            entity_id = id,
            allowed,
            "entity capability check"
        );
        Ok(allowed)
    }
}

#[async_trait]
impl Authorizer for CapabilityAuthorizer {
    fn can_publish(&self, principal: &Principal) -> bool {
        principal.has(Capability::PublishPosts)
    }

    async fn can_edit(&self, principal: &Principal, id: EntityId) -> Result<bool, StoreError> {
        self.check(principal, id, Action::Edit).await
    }

    async fn can_delete(&self, principal: &Principal, id: EntityId) -> Result<bool, StoreError> {
        self.check(principal, id, Action::Delete).await
    }
}
