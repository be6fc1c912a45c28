//! PostgreSQL implementation of ContentStore
//!
//! Each block is one row in `content_blocks`. The full block document lives
//! in the `payload` JSONB column; key, parent and edit columns are kept
//! alongside it for lookups.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{PgPool, Row};
use studio_bridge_core::{AsideInstance, BlockUsageLocator, ContentBlock, UserId};
use tracing::{debug, instrument};

use crate::error::{DbError, DbResult};
use crate::pool::verify_pool_health;
use crate::store::{prepare_write, ContentStore};

/// PostgreSQL-backed content store
#[derive(Debug, Clone)]
pub struct PostgresContentStore {
    pool: PgPool,
}

impl PostgresContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    #[instrument(skip(self), fields(location = %location))]
    async fn get_item(&self, location: &BlockUsageLocator) -> DbResult<ContentBlock> {
        let row = sqlx::query("SELECT payload FROM content_blocks WHERE usage_key = $1")
            .bind(location.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row_to_block(&row),
            None => Err(DbError::NotFound(location.to_string())),
        }
    }

    async fn has_item(&self, location: &BlockUsageLocator) -> DbResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM content_blocks WHERE usage_key = $1)")
                .bind(location.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[instrument(skip(self, block), fields(location = %block.location))]
    async fn insert_item(&self, block: ContentBlock, user: &UserId) -> DbResult<ContentBlock> {
        let stored = prepare_write(&block, user, &[]);
        let mut conn = self.pool.acquire().await?;
        insert_row(&mut conn, &stored).await?;

        debug!("Inserted block");
        Ok(stored)
    }

    #[instrument(skip(self, block), fields(parent = %parent, location = %block.location))]
    async fn create_child(
        &self,
        parent: &BlockUsageLocator,
        block: ContentBlock,
        user: &UserId,
    ) -> DbResult<ContentBlock> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT payload FROM content_blocks WHERE usage_key = $1 FOR UPDATE")
            .bind(parent.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let mut parent_block = match row {
            Some(row) => row_to_block(&row)?,
            None => return Err(DbError::NotFound(parent.to_string())),
        };

        let mut child = prepare_write(&block, user, &[]);
        child.parent = Some(parent.clone());
        insert_row(&mut tx, &child).await?;

        parent_block.add_child(child.location.clone());
        parent_block.record_edit(user);
        update_row(&mut tx, &parent_block).await?;

        tx.commit().await?;

        debug!("Created child block");
        Ok(child)
    }

    #[instrument(skip(self, block, asides), fields(location = %block.location, asides = asides.len()))]
    async fn update_item(
        &self,
        block: &ContentBlock,
        user: &UserId,
        asides: &[AsideInstance],
    ) -> DbResult<ContentBlock> {
        let stored = prepare_write(block, user, asides);
        let mut conn = self.pool.acquire().await?;
        update_row(&mut conn, &stored).await?;

        debug!("Updated block");
        Ok(stored)
    }

    async fn ping(&self) -> DbResult<()> {
        verify_pool_health(&self.pool).await
    }
}

async fn insert_row(conn: &mut PgConnection, block: &ContentBlock) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO content_blocks (
            usage_key, context_key, block_type, parent_key, payload, edited_by, edited_on
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(block.location.to_string())
    .bind(block.location.context_key().to_string())
    .bind(block.category())
    .bind(block.parent.as_ref().map(ToString::to_string))
    .bind(serde_json::to_value(block)?)
    .bind(block.edit_info.edited_by.as_ref().map(|user| user.as_str().to_string()))
    .bind(block.edit_info.edited_on)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn update_row(conn: &mut PgConnection, block: &ContentBlock) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE content_blocks
        SET parent_key = $2, payload = $3, edited_by = $4, edited_on = $5
        WHERE usage_key = $1
        "#,
    )
    .bind(block.location.to_string())
    .bind(block.parent.as_ref().map(ToString::to_string))
    .bind(serde_json::to_value(block)?)
    .bind(block.edit_info.edited_by.as_ref().map(|user| user.as_str().to_string()))
    .bind(block.edit_info.edited_on)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(block.location.to_string()));
    }
    Ok(())
}

fn row_to_block(row: &PgRow) -> DbResult<ContentBlock> {
    let payload: JsonValue = row.try_get("payload")?;
    let block: ContentBlock = serde_json::from_value(payload)?;
    Ok(block)
}
