//! Share repository for Loft.

use sqlx::SqliteConnection;
use uuid::Uuid;

use super::record::{NewShare, ShareRecord};
use crate::{LoftError, Result};

const SHARE_COLUMNS: &str = "id, node_id, owner_id, code, expire_time, created_at";

/// Repository for share records.
pub struct ShareRepository;

impl ShareRepository {
    /// Create a new share record with a fresh UUID.
    pub async fn create(conn: &mut SqliteConnection, new_share: &NewShare) -> Result<ShareRecord> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO shares (id, node_id, owner_id, code, expire_time)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(new_share.node_id)
        .bind(new_share.owner_id)
        .bind(&new_share.code)
        .bind(&new_share.expire_time)
        .execute(&mut *conn)
        .await?;

        Self::get_by_id(conn, &id)
            .await?
            .ok_or_else(|| LoftError::NotFound("share".to_string()))
    }

    /// Get a share record by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<ShareRecord>> {
        let share = sqlx::query_as::<_, ShareRecord>(&format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(share)
    }

    /// List a user's share records, newest first.
    pub async fn list_by_owner(
        conn: &mut SqliteConnection,
        owner_id: i64,
    ) -> Result<Vec<ShareRecord>> {
        let shares = sqlx::query_as::<_, ShareRecord>(&format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE owner_id = ?
             ORDER BY created_at DESC, id"
        ))
        .bind(owner_id)
        .fetch_all(conn)
        .await?;

        Ok(shares)
    }

    /// Delete a share record.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every share record of a node. Returns the number removed.
    pub async fn delete_by_node(conn: &mut SqliteConnection, node_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM shares WHERE node_id = ?")
            .bind(node_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
