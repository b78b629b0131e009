//! orders-server: loads configuration, opens the configured store and serves
//! the order REST API until SIGTERM or Ctrl+C.

use anyhow::Result;
use orders::config::{AppConfig, StorageBackend};
use orders::logging::init_logging;
use orders::server::ServerBuilder;
use orders::storage::InMemoryOrderStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let builder = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("using in-memory storage");
            ServerBuilder::new().with_store(InMemoryOrderStore::new())
        }
        StorageBackend::Postgres => postgres_builder(&config).await?,
    };

    builder.serve(&config.server.bind_addr()).await
}

#[cfg(feature = "postgres")]
async fn postgres_builder(config: &AppConfig) -> Result<ServerBuilder> {
    use orders::storage::postgres::{connect, run_migrations};
    use orders::storage::PostgresOrderStore;

    let pool = connect(&config.database).await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "connected to PostgreSQL"
    );

    if config.database.auto_migrate {
        run_migrations(&pool).await?;
        tracing::info!("migrations applied");
    }

    Ok(ServerBuilder::new().with_store(PostgresOrderStore::new(pool)))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_builder(_config: &AppConfig) -> Result<ServerBuilder> {
    anyhow::bail!("storage backend 'postgres' requires the `postgres` feature")
}
