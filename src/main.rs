use std::sync::Arc;

use anyhow::Context;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing_subscriber::EnvFilter;

use refbase::{
    auth::jwt::JwtService,
    config::AppConfig,
    db,
    routes::create_router,
    state::AppState,
    storage::LocalFileStore,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        upload_dir = %config.upload_dir,
        locale = %config.default_locale,
        "starting refbase"
    );

    let pool = db::init_pool(&config.database_url, config.database_max_pool_size)?;

    {
        let mut conn = pool.get().context("acquiring connection for migrations")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!("running migrations: {err}"))?;
    }

    let files = Arc::new(LocalFileStore::new(&config.upload_dir));
    let jwt = JwtService::from_config(&config)?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(pool, config, files, jwt);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
