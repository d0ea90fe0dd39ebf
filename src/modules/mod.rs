pub mod assistant;
pub mod catalog;
pub mod dashboard;
pub mod ui;

use std::sync::Arc;

use shelfd_kernel::ModuleRegistry;
use shelfd_ollama::OllamaClient;
use shelfd_store::CatalogStore;

/// Register all application modules with the registry.
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: Arc<CatalogStore>,
    ollama: Arc<OllamaClient>,
) {
    registry.register(catalog::create_module(store.clone()));
    registry.register(assistant::create_module(ollama, store.clone()));
    registry.register(dashboard::create_module(store));
}
