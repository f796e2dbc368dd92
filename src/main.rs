use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use patients_api::api::{start_server, ApiContext};
use patients_api::{config, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Fail fast if the database cannot be opened; this also runs the
    // schema migration before the first request arrives.
    db::open_database(&db_path)?;
    tracing::info!(path = %db_path.display(), "database ready");

    let addr: SocketAddr = config::bind_addr().parse()?;
    let mut server = start_server(ApiContext::new(db_path), addr).await?;
    tracing::info!(addr = %server.addr, "serving /api/patients");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    server.shutdown();
    server.wait().await;

    Ok(())
}
