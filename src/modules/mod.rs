pub mod books;

use folio_kernel::ModuleRegistry;

use crate::bootstrap::Services;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, services: &Services) {
    registry.register(books::create_module(services));
}
