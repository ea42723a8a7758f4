use std::sync::Arc;

use postgram::{
    config::Config,
    repositories::{changes::CollectionChanges, PostgresRepo},
    routes::create_routes,
    services::{notifications::NotificationHub, preview::DataUrlDecoder},
    storage::LocalObjectStorage,
    AppState, Result,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("postgram=info,tower_http=info")),
        )
        .init();

    if let Err(err) = run().await {
        error!("🔥 {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::init()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    info!("✅ Connection to the database is successful!");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let storage = LocalObjectStorage::new(config.media_dir.clone(), config.public_base_url.clone());
    storage.ensure_root().await?;

    let posts_repo = PostgresRepo::new(pool, CollectionChanges::default(), config.snapshot_buffer);

    let app_state = AppState {
        config: config.clone(),
        posts_repo: Arc::new(posts_repo),
        storage: Arc::new(storage),
        decoder: Arc::new(DataUrlDecoder),
        notifications: NotificationHub::new(config.notification_buffer),
    };

    let app = create_routes(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.port)).await?;
    info!(port = config.port, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
