//! Per-user storage quota ledger for Loft.
//!
//! Every mutation that creates or removes file bytes adjusts the owner's
//! `storage_used` counter on the same transaction, so the ledger always
//! equals the byte sum of the user's file nodes once the transaction
//! commits.

use sqlx::SqliteConnection;

use crate::{LoftError, Result};

/// Quota ledger operations.
pub struct QuotaLedger;

impl QuotaLedger {
    /// Apply a signed byte delta to a user's storage counter.
    pub async fn adjust(conn: &mut SqliteConnection, user_id: i64, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        sqlx::query("UPDATE users SET storage_used = storage_used + ? WHERE id = ?")
            .bind(delta)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Current storage usage for a user, in bytes.
    pub async fn usage(conn: &mut SqliteConnection, user_id: i64) -> Result<i64> {
        let used: i64 = sqlx::query_scalar("SELECT storage_used FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| LoftError::NotFound("user".to_string()))?;
        Ok(used)
    }

    /// Check that `incoming` additional bytes fit within `limit`
    /// (0 = unlimited).
    pub async fn check(
        conn: &mut SqliteConnection,
        user_id: i64,
        incoming: i64,
        limit: i64,
    ) -> Result<()> {
        if limit == 0 {
            return Ok(());
        }
        let used = Self::usage(conn, user_id).await?;
        if used + incoming > limit {
            return Err(LoftError::Validation(format!(
                "storage quota exceeded: {} of {} bytes used, {} more requested",
                used, limit, incoming
            )));
        }
        Ok(())
    }

    /// Repair pass: recompute the counter from the user's file nodes.
    ///
    /// Returns the corrected value.
    pub async fn reconcile(conn: &mut SqliteConnection, user_id: i64) -> Result<i64> {
        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(size), 0) FROM nodes WHERE owner_id = ? AND is_folder = 0",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("UPDATE users SET storage_used = ? WHERE id = ?")
            .bind(actual)
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(actual)
    }
}
