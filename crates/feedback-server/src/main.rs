use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use feedback_api::AppStateInner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedback=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let session_secret =
        std::env::var("FEEDBACK_SESSION_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("FEEDBACK_DB_PATH").unwrap_or_else(|_| "feedback.db".into());
    let host = std::env::var("FEEDBACK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FEEDBACK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = feedback_db::Database::open(&PathBuf::from(&db_path))?;

    let state = Arc::new(AppStateInner { db, session_secret });

    let app = feedback_server::app(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Feedback server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
