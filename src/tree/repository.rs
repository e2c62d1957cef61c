//! Node repository for the Loft file tree.
//!
//! All functions take a `&mut SqliteConnection` so the mutation engine can
//! run every read and write of one operation on a single transaction. That
//! transaction is the consistent snapshot which prevents lost updates to
//! folder sizes under concurrent mutations.

use std::collections::VecDeque;

use sqlx::SqliteConnection;

use super::node::{NewNode, Node};
use crate::{LoftError, Result};

const NODE_COLUMNS: &str = "id, name, original_name, is_folder, size, mime_type, owner_id, \
                            parent_id, storage_path, created_at, last_accessed, is_shared, \
                            shared_by";

/// Repository for node records.
pub struct NodeRepository;

impl NodeRepository {
    /// Create a new node.
    pub async fn create(conn: &mut SqliteConnection, new_node: &NewNode) -> Result<Node> {
        let result = sqlx::query(
            "INSERT INTO nodes (name, original_name, is_folder, size, mime_type, owner_id,
                                parent_id, storage_path, is_shared, shared_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_node.name)
        .bind(&new_node.original_name)
        .bind(new_node.is_folder)
        .bind(new_node.size)
        .bind(&new_node.mime_type)
        .bind(new_node.owner_id)
        .bind(new_node.parent_id)
        .bind(&new_node.storage_path)
        .bind(new_node.is_shared)
        .bind(new_node.shared_by)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_rowid();
        Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))
    }

    /// Get a node by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(node)
    }

    /// Get a node by ID, restricted to one owner.
    pub async fn get_owned(
        conn: &mut SqliteConnection,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id = ? AND owner_id = ?"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(conn)
        .await?;

        Ok(node)
    }

    /// List a user's direct children of a folder (None = root level),
    /// newest first.
    pub async fn list_children(
        conn: &mut SqliteConnection,
        owner_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE owner_id = ? AND parent_id IS ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .bind(parent_id)
        .fetch_all(conn)
        .await?;

        Ok(nodes)
    }

    /// All direct children of a folder, in id order.
    pub async fn children_of(conn: &mut SqliteConnection, parent_id: i64) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = ? ORDER BY id"
        ))
        .bind(parent_id)
        .fetch_all(conn)
        .await?;

        Ok(nodes)
    }

    /// Case-insensitive substring search on the user-facing name,
    /// newest first.
    pub async fn search(
        conn: &mut SqliteConnection,
        owner_id: i64,
        pattern: &str,
    ) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE owner_id = ? AND original_name LIKE '%' || ? || '%'
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(conn)
        .await?;

        Ok(nodes)
    }

    /// Most recently accessed files (not folders) of a user.
    pub async fn list_recent(
        conn: &mut SqliteConnection,
        owner_id: i64,
        limit: i64,
    ) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE owner_id = ? AND is_folder = 0
             ORDER BY last_accessed DESC, id DESC
             LIMIT ?"
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(nodes)
    }

    /// Shared nodes visible to a user: ones they shared plus copies saved
    /// from other users' shares.
    pub async fn list_shared_with(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE is_shared = 1 AND (owner_id = ? OR shared_by = ?)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        Ok(nodes)
    }

    /// Collect a node's entire subtree breadth-first, root included.
    pub async fn collect_subtree(conn: &mut SqliteConnection, root: &Node) -> Result<Vec<Node>> {
        let mut subtree = vec![root.clone()];
        let mut queue = VecDeque::from([root.id]);

        while let Some(parent_id) = queue.pop_front() {
            let children = Self::children_of(conn, parent_id).await?;
            for child in children {
                if child.is_folder {
                    queue.push_back(child.id);
                }
                subtree.push(child);
            }
        }

        Ok(subtree)
    }

    /// Reassign a node's parent.
    pub async fn set_parent(
        conn: &mut SqliteConnection,
        id: i64,
        parent_id: Option<i64>,
    ) -> Result<()> {
        sqlx::query("UPDATE nodes SET parent_id = ? WHERE id = ?")
            .bind(parent_id)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Update the user-facing name.
    pub async fn set_original_name(
        conn: &mut SqliteConnection,
        id: i64,
        original_name: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE nodes SET original_name = ? WHERE id = ?")
            .bind(original_name)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Update the shared flag and sharer reference.
    pub async fn set_shared(
        conn: &mut SqliteConnection,
        id: i64,
        is_shared: bool,
        shared_by: Option<i64>,
    ) -> Result<()> {
        sqlx::query("UPDATE nodes SET is_shared = ?, shared_by = ? WHERE id = ?")
            .bind(is_shared)
            .bind(shared_by)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Record an access to a node.
    pub async fn touch_accessed(conn: &mut SqliteConnection, id: i64) -> Result<()> {
        sqlx::query("UPDATE nodes SET last_accessed = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Delete a node row.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of nodes referencing a blob address.
    ///
    /// Copies share blob addresses, so a blob may only be removed from
    /// storage once this reaches zero.
    pub async fn blob_reference_count(
        conn: &mut SqliteConnection,
        storage_path: &str,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE storage_path = ?")
            .bind(storage_path)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }
}
