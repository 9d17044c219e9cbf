use sqlx::postgres::{PgPoolOptions, PgConnectOptions};
use sqlx::PgPool;
use std::str::FromStr;
use tokio::sync::OnceCell;

/// Process-wide pool singleton, following the teacher's `DB_POOL: OnceCell<Arc<SqlitePool>>`
/// pattern (`kftray-commons/src/utils/db.rs`), adapted to a connection-pooled server process
/// where the pool is built once from configuration rather than lazily from a fixed file path.
static DB_POOL: OnceCell<PgPool> = OnceCell::const_new();

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn get_or_init_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<&'static PgPool, sqlx::Error> {
    DB_POOL
        .get_or_try_init(|| async { init_pool(database_url, max_connections).await })
        .await
}
