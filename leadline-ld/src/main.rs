//! leadline-ld - List Distribution service
//!
//! Ingests tabular contact lists (CSV/XLSX), splits them evenly across the
//! owner's agent roster, persists every assignment, and serves grouped
//! distribution views.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use leadline_common::config;
use leadline_common::db;
use leadline_ld::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "leadline-ld", about = "LeadLine List Distribution service")]
struct Args {
    /// Root folder holding the service database
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification immediately after tracing init, before any
    // database delays
    info!(
        "Starting LeadLine List Distribution (leadline-ld) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = db::init_database(&db_path).await?;
    info!("Database connection established");

    let state = AppState::new(pool);
    let app = build_router(state);

    let port = config::resolve_port(args.port);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("leadline-ld listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
