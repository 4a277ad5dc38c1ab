use powergate::{export::ExportSweeper, http, Gateway, GatewayConfig};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting powergate server");

    // Load configuration from environment
    let config = GatewayConfig::from_env()?;

    info!("Upstream: {} (project {}, node {})", config.upstream_root_url, config.project_name, config.node_name);
    info!("Meters: {}", config.meter_tags.len());
    info!("Export directory: {}", config.export_dir);

    let gateway = Gateway::from_config(&config)?;
    tokio::fs::create_dir_all(gateway.exports().dir()).await?;

    let _sweep_handle = ExportSweeper::new(
        gateway.exports().dir(),
        config.export_sweep_interval()?,
        config.export_lifetime()?,
    )
    .spawn();

    let app = http::router(Arc::new(gateway));

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
