use mwaggregator::CatalogServerExt;
use mwconfig::get_config;
use mwserver::{LoggingOptions, ServerBuilder};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();

    // ========== PHASE 1 : Infrastructure ==========
    let mut server = ServerBuilder::new_configured().build();
    server.init_logging(LoggingOptions::from_config(&config)).await;

    let info = server.info();
    server
        .add_route("/info", move || {
            let info = info.clone();
            async move { info }
        })
        .await;

    // ========== PHASE 2 : Catalogue ==========
    info!("📡 Initializing catalog API...");
    let catalog = server.init_catalog_configured().await?;
    info!(
        "✅ Catalog ready ({} provider(s), cache: {})",
        catalog.orchestrator().provider_kinds().len(),
        catalog.cache().backend_name()
    );

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("✅ MistressWorld is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
