//! Persistence: pool setup, migrations and the message store implementations.

pub mod memory_store;
pub mod message_store;

pub use memory_store::InMemoryMessageStore;
pub use message_store::{AdminFilter, MessageEdit, MessageStore, PgMessageStore};

use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Postgres};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub const SERVICE_NAME: &str = "private-messaging-service";

pub async fn init_pool(database_url: &str) -> Result<Pool<Postgres>, sqlx::Error> {
    let cfg = DbPoolConfig::with_url(SERVICE_NAME, database_url);
    cfg.log_config();
    let pool = create_pg_pool(cfg).await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
