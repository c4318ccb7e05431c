use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use folio_kernel::EntityTypeRegistry;
use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::entity::{Entity, EntityId, EntityPatch, NewEntity, Status};
use crate::query::{EntityQuery, Order, OrderBy, Page};
use crate::slug::{slugify, unique_slug, TRASHED_SUFFIX};
use crate::store::{EntityStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    last_id: EntityId,
    entities: BTreeMap<EntityId, Entity>,
}

/// Process-local entity store. Writes are serialized behind one lock.
#[derive(Debug)]
pub struct MemoryStore {
    types: Arc<EntityTypeRegistry>,
    trash_enabled: bool,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(types: Arc<EntityTypeRegistry>) -> Self {
        Self {
            types,
            trash_enabled: true,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn with_trash(mut self, enabled: bool) -> Self {
        self.trash_enabled = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.inner.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entities.is_empty()
    }
}

impl Inner {
    fn slug_for(&self, entity_type: &str, title: &str, id: EntityId, exclude: Option<EntityId>) -> String {
        let mut base = slugify(title);
        if base.is_empty() {
            base = id.to_string();
        }
        unique_slug(&base, |candidate| {
            self.entities.values().any(|entity| {
                Some(entity.id) != exclude
                    && entity.entity_type == entity_type
                    && entity.slug == candidate
            })
        })
    }
}

/// Trash `entity`, remembering its status and freeing its slug.
fn move_to_trash(entity: &mut Entity) {
    entity.trashed_from = Some(std::mem::replace(&mut entity.status, Status::Trash));
    entity.slug.push_str(TRASHED_SUFFIX);
}

fn matches_search(entity: &Entity, needle: &str) -> bool {
    entity.title.to_lowercase().contains(needle) || entity.content.to_lowercase().contains(needle)
}

fn compare(a: &Entity, b: &Entity, order_by: OrderBy) -> Ordering {
    let primary = match order_by {
        OrderBy::Date => a.created_at.cmp(&b.created_at),
        OrderBy::Id => a.id.cmp(&b.id),
        OrderBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        OrderBy::Slug => a.slug.cmp(&b.slug),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find(&self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.inner.read().entities.get(&id).cloned())
    }

    async fn query(&self, query: &EntityQuery) -> Result<Page<Entity>, StoreError> {
        let needle = query.search.as_deref().map(str::to_lowercase);
        let inner = self.inner.read();

        let mut matched: Vec<&Entity> = inner
            .entities
            .values()
            .filter(|entity| entity.entity_type == query.entity_type)
            .filter(|entity| !entity.status.is_trashed())
            .filter(|entity| needle.as_deref().map_or(true, |n| matches_search(entity, n)))
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare(a, b, query.order_by);
            match query.order {
                Order::Asc => ordering,
                Order::Desc => ordering.reverse(),
            }
        });

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(Page::new(items, total, query.per_page))
    }

    async fn insert(&self, entity: NewEntity) -> Result<EntityId, StoreError> {
        if !self.types.contains(&entity.entity_type) {
            return Err(StoreError::UnknownType(entity.entity_type));
        }
        if entity.title.trim().is_empty() && entity.content.trim().is_empty() {
            return Err(StoreError::Invalid {
                field: "title",
                reason: "title and content are both empty".to_string(),
            });
        }

        let mut inner = self.inner.write();
        let id = inner.last_id + 1;
        let slug = inner.slug_for(&entity.entity_type, &entity.title, id, None);
        let now = OffsetDateTime::now_utc();

        inner.entities.insert(
            id,
            Entity {
                id,
                entity_type: entity.entity_type,
                title: entity.title,
                content: entity.content,
                status: entity.status,
                author: entity.author,
                slug,
                created_at: now,
                modified_at: now,
                trashed_from: None,
            },
        );
        inner.last_id = id;

        tracing::debug!(target: "folio-db", id, "entity inserted");
        Ok(id)
    }

    async fn update(&self, id: EntityId, patch: EntityPatch) -> Result<EntityId, StoreError> {
        let mut inner = self.inner.write();
        let current = inner
            .entities
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;

        let mut updated = current.clone();
        if let Some(title) = patch.title {
            updated.title = title;
        }
        if let Some(content) = patch.content {
            updated.content = content;
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }

        // Entering or leaving the trash keeps slug and previous status in step.
        if !current.status.is_trashed() && updated.status.is_trashed() {
            updated.status = current.status.clone();
            move_to_trash(&mut updated);
        } else if current.status.is_trashed() && !updated.status.is_trashed() {
            if let Some(original) = updated.slug.strip_suffix(TRASHED_SUFFIX) {
                updated.slug = inner.slug_for(&updated.entity_type, original, id, Some(id));
            }
            updated.trashed_from = None;
        }

        updated.modified_at = OffsetDateTime::now_utc();
        inner.entities.insert(id, updated);

        tracing::debug!(target: "folio-db", id, "entity updated");
        Ok(id)
    }

    async fn delete(&self, id: EntityId, force: bool) -> Result<Entity, StoreError> {
        let mut inner = self.inner.write();
        let entity = inner.entities.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if force || !self.trash_enabled || entity.status.is_trashed() {
            let removed = inner
                .entities
                .remove(&id)
                .ok_or(StoreError::NotFound(id))?;
            tracing::debug!(target: "folio-db", id, "entity deleted permanently");
            return Ok(removed);
        }

        move_to_trash(entity);
        entity.modified_at = OffsetDateTime::now_utc();

        tracing::debug!(target: "folio-db", id, "entity moved to trash");
        Ok(entity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_kernel::EntityType;

    fn store() -> MemoryStore {
        let types = Arc::new(EntityTypeRegistry::new());
        types.register(EntityType::new("book", "Book")).unwrap();
        types.register(EntityType::new("note", "Note")).unwrap();
        MemoryStore::new(types)
    }

    fn new_book(title: &str) -> NewEntity {
        NewEntity {
            entity_type: "book".to_string(),
            title: title.to_string(),
            content: format!("About {title}"),
            status: Status::Publish,
            author: 1,
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_unique_slugs() {
        let store = store();
        let first = store.insert(new_book("Dune")).await.unwrap();
        let second = store.insert(new_book("Dune")).await.unwrap();

        assert_eq!((first, second), (1, 2));
        let second = store.find(second).await.unwrap().unwrap();
        assert_eq!(second.slug, "dune-2");
    }

    #[tokio::test]
    async fn insert_rejects_unregistered_type() {
        let store = store();
        let mut entity = new_book("Dune");
        entity.entity_type = "movie".to_string();

        let err = store.insert(entity).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownType(name) if name == "movie"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn query_filters_type_and_search() {
        let store = store();
        store.insert(new_book("Dune")).await.unwrap();
        store.insert(new_book("Emma")).await.unwrap();
        let mut note = new_book("Dune notes");
        note.entity_type = "note".to_string();
        store.insert(note).await.unwrap();

        let page = store
            .query(&EntityQuery::new("book").search("DUNE"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Dune");
    }

    #[tokio::test]
    async fn query_pages_cover_every_entity_once() {
        let store = store();
        for n in 0..23 {
            store.insert(new_book(&format!("Book {n}"))).await.unwrap();
        }

        let mut seen = Vec::new();
        for page in 1..=3 {
            let result = store
                .query(
                    &EntityQuery::new("book")
                        .order_by(OrderBy::Date, Order::Desc)
                        .paginate(page, 10),
                )
                .await
                .unwrap();
            assert_eq!(result.total, 23);
            assert_eq!(result.total_pages, 3);
            seen.extend(result.items.into_iter().map(|e| e.id));
        }

        assert_eq!(seen.len(), 23);
        let expected: Vec<EntityId> = (1..=23).rev().collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn query_orders_by_title() {
        let store = store();
        for title in ["beta", "Alpha", "gamma"] {
            store.insert(new_book(title)).await.unwrap();
        }

        let page = store
            .query(&EntityQuery::new("book").order_by(OrderBy::Title, Order::Asc))
            .await
            .unwrap();
        let titles: Vec<_> = page.items.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let store = store();
        let id = store.insert(new_book("Dune")).await.unwrap();

        store
            .update(
                id,
                EntityPatch {
                    status: Some(Status::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let entity = store.find(id).await.unwrap().unwrap();
        assert_eq!(entity.status, Status::Draft);
        assert_eq!(entity.title, "Dune");
        assert_eq!(entity.content, "About Dune");
        assert!(entity.modified_at >= entity.created_at);
    }

    #[tokio::test]
    async fn update_missing_entity_fails() {
        let store = store();
        let err = store.update(9, EntityPatch::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(9)));
    }

    #[tokio::test]
    async fn soft_delete_trashes_and_hides_from_queries() {
        let store = store();
        let id = store.insert(new_book("Dune")).await.unwrap();

        let trashed = store.delete(id, false).await.unwrap();
        assert_eq!(trashed.status, Status::Trash);
        assert_eq!(trashed.slug, "dune__trashed");
        assert_eq!(trashed.trashed_from, Some(Status::Publish));

        assert!(store.find(id).await.unwrap().is_some());
        assert_eq!(store.query(&EntityQuery::new("book")).await.unwrap().total, 0);

        // Trashing again removes the entity for good.
        store.delete(id, false).await.unwrap();
        assert!(store.find(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restoring_from_trash_restores_slug() {
        let store = store();
        let id = store.insert(new_book("Dune")).await.unwrap();
        store.delete(id, false).await.unwrap();

        store
            .update(
                id,
                EntityPatch {
                    status: Some(Status::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let entity = store.find(id).await.unwrap().unwrap();
        assert_eq!(entity.slug, "dune");
        assert_eq!(entity.trashed_from, None);
    }

    #[tokio::test]
    async fn forced_or_trashless_delete_is_permanent() {
        let store = store();
        let id = store.insert(new_book("Dune")).await.unwrap();
        store.delete(id, true).await.unwrap();
        assert!(store.find(id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(id, true).await,
            Err(StoreError::NotFound(_))
        ));

        let store = self::store().with_trash(false);
        let id = store.insert(new_book("Emma")).await.unwrap();
        store.delete(id, false).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn status_update_to_trash_matches_soft_delete() {
        let store = store();
        let id = store.insert(new_book("Dune")).await.unwrap();

        store
            .update(
                id,
                EntityPatch {
                    status: Some(Status::Trash),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let entity = store.find(id).await.unwrap().unwrap();
        assert_eq!(entity.status, Status::Trash);
        assert_eq!(entity.slug, "dune__trashed");
        assert_eq!(entity.trashed_from, Some(Status::Publish));

        let reused = store.insert(new_book("Dune")).await.unwrap();
        assert_eq!(store.find(reused).await.unwrap().unwrap().slug, "dune");

        store
            .update(
                id,
                EntityPatch {
                    status: Some(Status::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let restored = store.find(id).await.unwrap().unwrap();
        assert_eq!(restored.slug, "dune-2");
        assert_eq!(restored.trashed_from, None);
    }
}
