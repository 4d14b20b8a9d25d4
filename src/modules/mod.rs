pub mod books;
pub mod sitemap;

use shelf_kernel::ModuleRegistry;
use shelf_kernel::settings::Settings;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    registry.register(books::create_module(settings)?);
    registry.register(sitemap::create_module(settings)?);
    Ok(())
}
