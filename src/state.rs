use crate::db::{DbPool, OrmConn, create_orm_conn, create_pool};

/// Shared handles for the order API handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    /// Open both the raw sqlx pool (audit writes, migrations) and the SeaORM
    /// connection (entities) against the same database.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = create_pool(database_url).await?;
        let orm = create_orm_conn(database_url).await?;
        Ok(Self { pool, orm })
    }
}
