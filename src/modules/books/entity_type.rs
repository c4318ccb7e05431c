use std::sync::Arc;

use folio_kernel::{EntityType, EntityTypeRegistry, RegistryError, Supports};

/// Storage name of the book entity type.
pub const BOOK_TYPE: &str = "hussainas_book";

/// Declaration of the book entity type.
pub fn book() -> EntityType {
    EntityType::new(BOOK_TYPE, "Book")
        .description("Books published through the book resource API")
        .supports(&[
            Supports::Title,
            Supports::Editor,
            Supports::Author,
            Supports::Thumbnail,
            Supports::Revisions,
        ])
        .public()
        .has_archive()
        .show_in_rest(super::REST_BASE)
}

/// Declare the book type. Safe to call more than once.
pub fn register(types: &EntityTypeRegistry) -> Result<Arc<EntityType>, RegistryError> {
    types.register(book())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_twice_keeps_one_declaration() {
        let types = EntityTypeRegistry::new();
        let first = register(&types).unwrap();
        let second = register(&types).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(types.names(), [BOOK_TYPE]);
    }

    #[test]
    fn book_is_public_and_in_rest() {
        let book = book();
        assert!(book.public && book.publicly_queryable && !book.exclude_from_search);
        assert!(!book.hierarchical);
        assert_eq!(book.rest_base, Some("books"));
        assert!(book.supports_feature(Supports::Revisions));
    }
}
