use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use cupid_api::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cupid_server=debug,cupid_api=debug,cupid_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("CUPID_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("CUPID_DB_PATH").unwrap_or_else(|_| "cupid.db".into());
    let host = std::env::var("CUPID_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CUPID_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let base_url =
        std::env::var("CUPID_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

    // Init database
    let db = cupid_db::Database::open(&PathBuf::from(&db_path))?;

    // Pre-load the official student roster when one is configured
    if let Ok(roster_path) = std::env::var("CUPID_ROSTER_PATH") {
        let added = cupid_db::roster::import_csv(&db, Path::new(&roster_path))?;
        info!("Imported {} roster entries from {}", added, roster_path);
    }

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        base_url,
    });

    let app = cupid_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Cupid server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
