use std::sync::Arc;

use filmorate::{AppState, build_router, catalog::Catalog, config::Config, open_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmorate=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let store = open_store(&config).await?;
    tracing::info!(storage = ?config.storage, "store ready");

    let state = Arc::new(AppState { config: config.clone(), catalog: Catalog::new(store) });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
