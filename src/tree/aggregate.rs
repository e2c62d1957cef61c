//! Folder size aggregation for the Loft file tree.
//!
//! A folder's `size` is the byte sum of every file below it. When a file
//! changes (created, deleted, moved, copied), the delta walks the ancestor
//! chain once. The walk is an explicit loop bounded by tree depth and must
//! run on the same transaction as the triggering mutation: callers invoke it
//! exactly once per mutation, and a rollback undoes the whole chain.

use std::collections::HashMap;

use sqlx::SqliteConnection;

use crate::Result;

/// Folder size aggregation operations.
pub struct FolderSizeAggregator;

impl FolderSizeAggregator {
    /// Add `delta` (may be negative) to the folder `start` and every
    /// ancestor above it.
    ///
    /// `start` is the parent of the item that changed; None means the item
    /// sits at root level and there is nothing to update.
    pub async fn propagate(
        conn: &mut SqliteConnection,
        start: Option<i64>,
        delta: i64,
    ) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }

        let mut current = start;
        while let Some(folder_id) = current {
            let row: Option<(bool, Option<i64>)> =
                sqlx::query_as("SELECT is_folder, parent_id FROM nodes WHERE id = ?")
                    .bind(folder_id)
                    .fetch_optional(&mut *conn)
                    .await?;

            let Some((is_folder, parent_id)) = row else {
                break;
            };
            if !is_folder {
                break;
            }

            sqlx::query("UPDATE nodes SET size = size + ? WHERE id = ?")
                .bind(delta)
                .bind(folder_id)
                .execute(&mut *conn)
                .await?;

            current = parent_id;
        }

        Ok(())
    }

    /// Repair pass: recompute every folder size of a user bottom-up from
    /// its files.
    ///
    /// Returns the number of folders whose stored size was wrong.
    pub async fn reconcile(conn: &mut SqliteConnection, owner_id: i64) -> Result<usize> {
        let rows: Vec<(i64, Option<i64>, bool, i64)> =
            sqlx::query_as("SELECT id, parent_id, is_folder, size FROM nodes WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_all(&mut *conn)
                .await?;

        let parents: HashMap<i64, Option<i64>> =
            rows.iter().map(|&(id, parent, _, _)| (id, parent)).collect();
        let mut computed: HashMap<i64, i64> = rows
            .iter()
            .filter(|&&(_, _, is_folder, _)| is_folder)
            .map(|&(id, _, _, _)| (id, 0))
            .collect();

        // Each file adds its size to every ancestor folder.
        for &(_, parent, is_folder, size) in &rows {
            if is_folder {
                continue;
            }
            let mut current = parent;
            while let Some(folder_id) = current {
                if let Some(total) = computed.get_mut(&folder_id) {
                    *total += size;
                }
                current = parents.get(&folder_id).copied().flatten();
            }
        }

        let mut corrected = 0;
        for &(id, _, is_folder, size) in &rows {
            if !is_folder {
                continue;
            }
            let expected = computed[&id];
            if expected != size {
                sqlx::query("UPDATE nodes SET size = ? WHERE id = ?")
                    .bind(expected)
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                corrected += 1;
            }
        }

        Ok(corrected)
    }
}
