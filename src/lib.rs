//! shelfd application library.
//!
//! Wires the catalog store, the recommendation client, and the app modules
//! into one HTTP process.

pub mod modules;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use shelfd_kernel::settings::Settings;
use shelfd_kernel::{InitCtx, ModuleRegistry};
use shelfd_ollama::OllamaClient;
use shelfd_store::CatalogStore;

/// Load settings, assemble the modules, and serve until shutdown.
pub async fn run() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelfd settings")?;

    shelfd_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        store = %settings.store.path.display(),
        model = %settings.ollama.model,
        "shelfd starting"
    );

    let store = Arc::new(
        CatalogStore::open(&settings.store.path).with_context(|| "failed to open catalog store")?,
    );
    let ollama = Arc::new(
        OllamaClient::new(
            &settings.ollama.endpoint,
            &settings.ollama.model,
            Duration::from_secs(settings.ollama.timeout_secs),
        )
        .with_context(|| "failed to build recommendation client")?,
    );

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store.clone(), ollama.clone());

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let ui = modules::ui::router(store, ollama);
    shelfd_http::start_server(&registry, &settings, ui).await?;

    registry.stop_all().await?;
    tracing::info!("shelfd stopped");

    Ok(())
}
