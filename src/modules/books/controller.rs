//! Permission checks, CRUD operations and response shaping for books.

use std::sync::Arc;

use folio_authz::{Authorizer, Principal};
use folio_db::{Entity, EntityId, EntityPatch, EntityQuery, EntityStore, NewEntity, Page, Status, StoreError};
use folio_http::{error::AppError, links::RestUrl};
use time::format_description::well_known::Rfc3339;

use super::entity_type::BOOK_TYPE;
use super::models::{
    BookData, BookLinks, BookResponse, CreateArgs, DeletedBook, Link, ListArgs, UpdateArgs,
};
use super::{NAMESPACE, REST_BASE, USERS_ROUTE};
use crate::content::FilterChain;
use crate::utils::{sanitize_key, sanitize_post_html, sanitize_text_field};

fn book_not_found() -> AppError {
    AppError::not_found("Book not found.").with_code("rest_post_not_found")
}

/// Store failures during writes surface as operation errors with `code`.
fn write_failure(code: &'static str) -> impl Fn(StoreError) -> AppError {
    move |err| match err {
        StoreError::Invalid { .. } => AppError::from(err),
        other => AppError::operation(other.to_string()).with_code(code),
    }
}

/// Resource controller for `/books`. Built once and shared by every request.
pub struct BooksController {
    store: Arc<dyn EntityStore>,
    authorizer: Arc<dyn Authorizer>,
    content_filters: Arc<FilterChain>,
    urls: RestUrl,
}

impl BooksController {
    pub fn new(
        store: Arc<dyn EntityStore>,
        authorizer: Arc<dyn Authorizer>,
        content_filters: Arc<FilterChain>,
        urls: RestUrl,
    ) -> Self {
        Self {
            store,
            authorizer,
            content_filters,
            urls,
        }
    }

    /// The book with `id`, or not-found when absent or of another type.
    async fn find_book(&self, id: EntityId) -> Result<Entity, AppError> {
        match self.store.find(id).await? {
            Some(entity) if entity.is_type(BOOK_TYPE) => Ok(entity),
            _ => Err(book_not_found()),
        }
    }

    // Permission checks run before the operation body.

    pub fn list_permission_check(&self, _principal: &Principal) -> Result<(), AppError> {
        Ok(())
    }

    pub fn create_permission_check(&self, principal: &Principal) -> Result<(), AppError> {
        if self.authorizer.can_publish(principal) {
            Ok(())
        } else {
            Err(AppError::forbidden("Sorry, you are not allowed to create books.")
                .with_code("rest_cannot_create"))
        }
    }

    pub async fn get_permission_check(&self, _principal: &Principal, id: EntityId) -> Result<(), AppError> {
        self.find_book(id).await.map(|_| ())
    }

    pub async fn update_permission_check(&self, principal: &Principal, id: EntityId) -> Result<(), AppError> {
        self.find_book(id).await?;
        if self.authorizer.can_edit(principal, id).await? {
            Ok(())
        } else {
            Err(AppError::forbidden("Sorry, you are not allowed to edit this book.")
                .with_code("rest_cannot_edit"))
        }
    }

    pub async fn delete_permission_check(&self, principal: &Principal, id: EntityId) -> Result<(), AppError> {
        self.find_book(id).await?;
        if self.authorizer.can_delete(principal, id).await? {
            Ok(())
        } else {
            Err(AppError::forbidden("Sorry, you are not allowed to delete this book.")
                .with_code("rest_cannot_delete"))
        }
    }

    // Operations.

    pub async fn list(&self, args: &ListArgs) -> Result<Page<BookData>, AppError> {
        let mut query = EntityQuery::new(BOOK_TYPE)
            .order_by(args.order_by(), args.order())
            .paginate(args.page, args.per_page);
        if let Some(search) = &args.search {
            query = query.search(sanitize_text_field(search));
        }

        let page = self.store.query(&query).await?;
        tracing::debug!(
            total = page.total,
            page = args.page,
            per_page = args.per_page,
            "listed books"
        );

        // The store is shared with other types; only books leave the controller.
        let items: Vec<BookData> = page
            .items
            .iter()
            .filter(|entity| entity.is_type(BOOK_TYPE))
            .map(|entity| self.prepare_item(entity))
            .collect();
        Ok(Page {
            items,
            total: page.total,
            total_pages: page.total_pages,
        })
    }

    pub async fn get(&self, id: EntityId) -> Result<BookResponse, AppError> {
        let entity = self.find_book(id).await?;
        Ok(self.prepare_response(&entity))
    }

    /// Returns the created book and its location.
    pub async fn create(&self, principal: &Principal, args: CreateArgs) -> Result<(BookResponse, String), AppError> {
        let title = sanitize_text_field(&args.title);
        if title.is_empty() {
            return Err(AppError::validation(
                vec![serde_json::json!({ "field": "title", "error": "required" })],
                "Title is required.",
            )
            .with_code("rest_missing_title"));
        }

        let content = args
            .content
            .as_deref()
            .map(sanitize_post_html)
            .unwrap_or_default();

        let id = self
            .store
            .insert(NewEntity {
                entity_type: BOOK_TYPE.to_string(),
                title,
                content,
                status: Status::Publish,
                author: principal.user_id,
            })
            .await
            .map_err(write_failure("rest_insert_failed"))?;

        let entity = self.store.find(id).await?.ok_or_else(|| {
            AppError::operation(format!("book {id} vanished after insert")).with_code("rest_insert_failed")
        })?;

        tracing::info!(id, author = principal.user_id, "book created");
        Ok((self.prepare_response(&entity), self.item_url(id)))
    }

    pub async fn update(&self, id: EntityId, args: UpdateArgs) -> Result<BookResponse, AppError> {
        // Re-checked: the entity may be gone since the permission check.
        self.find_book(id).await?;

        let mut patch = EntityPatch::default();
        if let Some(title) = args.title {
            let title = sanitize_text_field(&title);
            if title.is_empty() {
                return Err(AppError::validation(
                    vec![serde_json::json!({ "field": "title", "error": "empty" })],
                    "Title cannot be empty.",
                ));
            }
            patch.title = Some(title);
        }
        if let Some(content) = args.content {
            patch.content = Some(sanitize_post_html(&content));
        }
        if let Some(status) = args.status {
            let key = sanitize_key(&status);
            if key.is_empty() {
                return Err(AppError::validation(
                    vec![serde_json::json!({ "field": "status", "error": "invalid" })],
                    "Invalid status.",
                ));
            }
            patch.status = Some(Status::from(key.as_str()));
        }

        let id = self
            .store
            .update(id, patch)
            .await
            .map_err(write_failure("rest_update_failed"))?;
        let entity = self.find_book(id).await?;

        tracing::info!(id, status = %entity.status, "book updated");
        Ok(self.prepare_response(&entity))
    }

    pub async fn delete(&self, id: EntityId, force: bool) -> Result<DeletedBook, AppError> {
        let entity = self.find_book(id).await?;
        let previous = self.prepare_item(&entity);

        self.store.delete(id, force).await.map_err(|err| {
            tracing::error!(id, error = %err, "book deletion failed");
            AppError::operation("Failed to delete the book.").with_code("rest_delete_failed")
        })?;

        tracing::info!(id, force, "book deleted");
        Ok(DeletedBook {
            deleted: true,
            previous,
        })
    }

    // Response shaping.

    fn collection_url(&self) -> String {
        self.urls.url(&format!("{NAMESPACE}/{REST_BASE}"))
    }

    fn item_url(&self, id: EntityId) -> String {
        self.urls.url(&format!("{NAMESPACE}/{REST_BASE}/{id}"))
    }

    fn display_title(entity: &Entity) -> String {
        match entity.status {
            Status::Private => format!("Private: {}", entity.title),
            _ => entity.title.clone(),
        }
    }

    pub fn prepare_item(&self, entity: &Entity) -> BookData {
        let date = entity
            .created_at
            .replace_nanosecond(0)
            .unwrap_or(entity.created_at)
            .format(&Rfc3339)
            .unwrap_or_default();

        BookData {
            id: entity.id,
            date,
            slug: entity.slug.clone(),
            status: entity.status.clone(),
            title: Self::display_title(entity),
            content: self.content_filters.render(&entity.content),
            author: entity.author,
        }
    }

    pub fn prepare_links(&self, entity: &Entity) -> BookLinks {
        BookLinks {
            self_link: vec![Link::new(self.item_url(entity.id))],
            collection: vec![Link::new(self.collection_url())],
            author: vec![Link::embeddable(
                self.urls.url(&format!("{USERS_ROUTE}/{}", entity.author)),
            )],
        }
    }

    pub fn prepare_response(&self, entity: &Entity) -> BookResponse {
        BookResponse {
            data: self.prepare_item(entity),
            links: self.prepare_links(entity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use folio_authz::{CapabilityAuthorizer, Role};
    use folio_db::{MemoryStore, Order, OrderBy};
    use folio_kernel::{EntityType, EntityTypeRegistry};

    /// Store whose deletions always fail.
    struct BrokenDeletes(MemoryStore);

    #[async_trait]
    impl EntityStore for BrokenDeletes {
        async fn find(&self, id: EntityId) -> Result<Option<Entity>, StoreError> {
            self.0.find(id).await
        }

        async fn query(&self, query: &EntityQuery) -> Result<Page<Entity>, StoreError> {
            self.0.query(query).await
        }

        async fn insert(&self, entity: NewEntity) -> Result<EntityId, StoreError> {
            self.0.insert(entity).await
        }

        async fn update(&self, id: EntityId, patch: EntityPatch) -> Result<EntityId, StoreError> {
            self.0.update(id, patch).await
        }

        async fn delete(&self, _id: EntityId, _force: bool) -> Result<Entity, StoreError> {
            Err(StoreError::Backend("disk on fire".into()))
        }
    }

    fn types() -> Arc<EntityTypeRegistry> {
        let types = Arc::new(EntityTypeRegistry::new());
        super::super::entity_type::register(&types).unwrap();
        types.register(EntityType::new("page", "Page")).unwrap();
        types
    }

    fn controller_over(store: Arc<dyn EntityStore>) -> BooksController {
        BooksController::new(
            store.clone(),
            Arc::new(CapabilityAuthorizer::new(store)),
            Arc::new(FilterChain::standard()),
            RestUrl::new("http://example.test", "api"),
        )
    }

    fn controller() -> (BooksController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(types()));
        (controller_over(store.clone()), store)
    }

    fn list_args(page: u64, per_page: u64) -> ListArgs {
        ListArgs {
            page,
            per_page,
            search: None,
            orderby: "id".into(),
            order: "asc".into(),
        }
    }

    fn create_args(title: &str, content: Option<&str>) -> CreateArgs {
        CreateArgs {
            title: title.into(),
            content: content.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_sanitizes_and_links() {
        let (books, _) = controller();
        let author = Principal::user(4, Role::Author);

        let (response, location) = books
            .create(
                &author,
                create_args("  <b>Dune</b>  ", Some("Spice<script>alert(1)</script>")),
            )
            .await
            .unwrap();

        assert_eq!(response.data.title, "Dune");
        assert_eq!(response.data.content, "<p>Spice</p>\n");
        assert_eq!(response.data.author, 4);
        assert_eq!(response.data.status, Status::Publish);
        assert_eq!(response.data.slug, "dune");
        assert_eq!(
            location,
            format!("http://example.test/api/hussainas/v1/books/{}", response.data.id)
        );
        assert_eq!(response.links.self_link[0].href, location);
        assert_eq!(
            response.links.collection[0].href,
            "http://example.test/api/hussainas/v1/books"
        );
        assert_eq!(
            response.links.author[0].href,
            "http://example.test/api/wp/v2/users/4"
        );
        assert!(response.links.author[0].embeddable);
    }

    #[tokio::test]
    async fn create_rejects_title_that_sanitizes_to_nothing() {
        let (books, store) = controller();
        let err = books
            .create(&Principal::user(1, Role::Editor), create_args("<i></i>  ", None))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "rest_missing_title");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn create_permission_requires_publish() {
        let (books, _) = controller();
        assert!(books
            .create_permission_check(&Principal::user(2, Role::Author))
            .is_ok());

        let err = books
            .create_permission_check(&Principal::anonymous())
            .unwrap_err();
        assert_eq!(err.code(), "rest_cannot_create");
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn other_types_are_not_books() {
        let (books, store) = controller();
        let page = store
            .insert(NewEntity {
                entity_type: "page".into(),
                title: "About".into(),
                content: String::new(),
                status: Status::Publish,
                author: 1,
            })
            .await
            .unwrap();

        let err = books.get(page).await.unwrap_err();
        assert_eq!(err.code(), "rest_post_not_found");
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);

        let admin = Principal::user(1, Role::Administrator);
        let err = books.update_permission_check(&admin, page).await.unwrap_err();
        assert_eq!(err.code(), "rest_post_not_found");
        let listed = books.list(&list_args(1, 10)).await.unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    async fn list_paginates_and_searches() {
        let (books, _) = controller();
        let editor = Principal::user(1, Role::Editor);
        for title in ["Alpha", "Beta", "Gamma", "Alphabet"] {
            books.create(&editor, create_args(title, None)).await.unwrap();
        }

        let page = books.list(&list_args(2, 3)).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Alphabet");

        let mut args = list_args(1, 10);
        args.search = Some("alpha".into());
        args.order = "desc".into();
        let found = books.list(&args).await.unwrap();
        let titles: Vec<_> = found.items.iter().map(|book| book.title.as_str()).collect();
        assert_eq!(titles, ["Alphabet", "Alpha"]);
        assert_eq!(args.order_by(), OrderBy::Id);
        assert_eq!(args.order(), Order::Desc);
    }

    #[tokio::test]
    async fn update_applies_partial_changes() {
        let (books, _) = controller();
        let editor = Principal::user(1, Role::Editor);
        let (created, _) = books
            .create(&editor, create_args("Draft title", Some("body")))
            .await
            .unwrap();
        let id = created.data.id;

        let updated = books
            .update(
                id,
                UpdateArgs {
                    status: Some("Private".into()),
                    ..UpdateArgs::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data.status, Status::Private);
        assert_eq!(updated.data.title, "Private: Draft title");
        assert_eq!(updated.data.content, "<p>body</p>\n");

        let err = books
            .update(
                id,
                UpdateArgs {
                    title: Some("   ".into()),
                    ..UpdateArgs::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "rest_invalid_param");

        let err = books.update(id + 100, UpdateArgs::default()).await.unwrap_err();
        assert_eq!(err.code(), "rest_post_not_found");
    }

    #[tokio::test]
    async fn edit_and_delete_permissions_follow_ownership() {
        let (books, _) = controller();
        let owner = Principal::user(7, Role::Author);
        let other = Principal::user(8, Role::Author);
        let (created, _) = books.create(&owner, create_args("Mine", None)).await.unwrap();
        let id = created.data.id;

        assert!(books.update_permission_check(&owner, id).await.is_ok());
        assert!(books.delete_permission_check(&owner, id).await.is_ok());

        let err = books.update_permission_check(&other, id).await.unwrap_err();
        assert_eq!(err.code(), "rest_cannot_edit");
        let err = books.delete_permission_check(&other, id).await.unwrap_err();
        assert_eq!(err.code(), "rest_cannot_delete");
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);

        let err = books.delete_permission_check(&owner, id + 1).await.unwrap_err();
        assert_eq!(err.code(), "rest_post_not_found");
    }

    #[tokio::test]
    async fn delete_reports_previous_state() {
        let (books, store) = controller();
        let editor = Principal::user(1, Role::Editor);
        let (created, _) = books.create(&editor, create_args("Gone", None)).await.unwrap();
        let id = created.data.id;

        let deleted = books.delete(id, false).await.unwrap();
        assert!(deleted.deleted);
        assert_eq!(deleted.previous.status, Status::Publish);
        assert_eq!(deleted.previous.slug, "gone");
        assert_eq!(store.len(), 1);

        books.delete(id, true).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(books.get(id).await.unwrap_err().code(), "rest_post_not_found");
    }

    #[tokio::test]
    async fn delete_failure_is_an_operation_error() {
        let types = types();
        let store: Arc<dyn EntityStore> = Arc::new(BrokenDeletes(MemoryStore::new(types)));
        let books = controller_over(store);
        let (created, _) = books
            .create(&Principal::user(1, Role::Editor), create_args("Sticky", None))
            .await
            .unwrap();

        let err = books.delete(created.data.id, true).await.unwrap_err();
        assert_eq!(err.code(), "rest_delete_failed");
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(books.get(created.data.id).await.is_ok());
    }

    #[tokio::test]
    async fn date_is_second_precision_utc() {
        let (books, _) = controller();
        let (created, _) = books
            .create(&Principal::user(1, Role::Editor), create_args("Clock", None))
            .await
            .unwrap();

        let date = &created.data.date;
        assert!(date.ends_with('Z'), "{date}");
        assert!(!date.contains('.'), "{date}");
        assert!(time::OffsetDateTime::parse(date, &Rfc3339).is_ok());
    }
}
