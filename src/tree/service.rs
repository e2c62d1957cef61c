//! Tree mutation engine for Loft.
//!
//! Every mutation here is one atomic unit: repository writes, folder size
//! propagation and quota adjustment run on a single transaction and commit
//! or roll back together. Blob operations sit outside the transaction; the
//! deletion path is best-effort on the blob side.

use std::collections::VecDeque;

use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::db::{Database, User};
use crate::quota::QuotaLedger;
use crate::settings::SettingsRepository;
use crate::storage::BlobStorage;
use crate::{LoftError, Result};

use super::aggregate::FolderSizeAggregator;
use super::node::{copy_name, NewNode, Node};
use super::repository::NodeRepository;
use super::{MAX_NAME_LENGTH, RECENT_LIMIT};

/// Result of a delete operation.
#[derive(Debug, Clone, Copy)]
pub struct DeleteResult {
    /// Number of node records removed (the node plus its subtree).
    pub nodes_removed: usize,
    /// File bytes removed, as subtracted from folder sizes and the quota.
    pub bytes_removed: i64,
}

/// A resolvable blob URL plus the display filename.
#[derive(Debug, Clone)]
pub struct DownloadInfo {
    /// Full URL the caller can fetch.
    pub url: String,
    /// User-facing filename.
    pub filename: String,
}

/// Preview URL for an inline-viewable file.
#[derive(Debug, Clone)]
pub struct PreviewInfo {
    /// Full URL the caller can embed.
    pub url: String,
    /// The file's mime type.
    pub mime_type: String,
}

/// Service for tree mutations and listings.
pub struct TreeService<'a> {
    db: &'a Database,
    storage: &'a BlobStorage,
    quota_limit: i64,
}

impl<'a> TreeService<'a> {
    /// Create a new TreeService with no quota limit.
    pub fn new(db: &'a Database, storage: &'a BlobStorage) -> Self {
        Self {
            db,
            storage,
            quota_limit: 0,
        }
    }

    /// Set the per-user quota limit in bytes (0 = unlimited).
    pub fn with_quota_limit(mut self, limit: i64) -> Self {
        self.quota_limit = limit;
        self
    }

    /// Get the configured quota limit.
    pub fn quota_limit(&self) -> i64 {
        self.quota_limit
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(LoftError::Validation("name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(LoftError::Validation(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Resolve an optional parent ID to a folder owned by `owner_id`.
    async fn resolve_parent(
        conn: &mut SqliteConnection,
        owner_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Option<i64>> {
        if let Some(id) = parent_id {
            let parent = NodeRepository::get_owned(conn, id, owner_id)
                .await?
                .filter(|p| p.is_folder)
                .ok_or_else(|| LoftError::Validation("parent folder not found".to_string()))?;
            Ok(Some(parent.id))
        } else {
            Ok(None)
        }
    }

    /// Upload a file.
    ///
    /// Requires the site base URL to be configured. The blob is written
    /// first; if the metadata transaction then fails for any reason, the
    /// orphaned blob is removed again.
    pub async fn upload(
        &self,
        owner: &User,
        original_name: &str,
        content: &[u8],
        parent_id: Option<i64>,
    ) -> Result<Node> {
        Self::validate_name(original_name)?;

        let size = content.len() as i64;
        let storage_path = self.storage.save(content, original_name)?;

        let result = self
            .upload_metadata(owner, original_name, &storage_path, size, parent_id)
            .await;

        if result.is_err() {
            // The blob cannot join the rolled-back transaction; remove it.
            if let Err(e) = self.storage.delete(&storage_path) {
                warn!(
                    storage_path = %storage_path,
                    error = %e,
                    "failed to remove blob after aborted upload"
                );
            }
        }

        result
    }

    async fn upload_metadata(
        &self,
        owner: &User,
        original_name: &str,
        storage_path: &str,
        size: i64,
        parent_id: Option<i64>,
    ) -> Result<Node> {
        let stored_name = storage_path
            .rsplit('/')
            .next()
            .unwrap_or(storage_path)
            .to_string();
        let mime_type = mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let mut tx = self.db.begin().await?;

        SettingsRepository::base_url(&mut tx).await?;
        let parent_id = Self::resolve_parent(&mut tx, owner.id, parent_id).await?;
        QuotaLedger::check(&mut tx, owner.id, size, self.quota_limit).await?;

        let new_node = NewNode::file(
            stored_name,
            original_name,
            storage_path,
            size,
            mime_type,
            owner.id,
        )
        .with_parent(parent_id);
        let node = NodeRepository::create(&mut tx, &new_node).await?;

        FolderSizeAggregator::propagate(&mut tx, parent_id, size).await?;
        QuotaLedger::adjust(&mut tx, owner.id, size).await?;

        tx.commit().await?;

        info!(node = node.id, owner = owner.id, size, "file uploaded");
        Ok(node)
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        owner: &User,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Node> {
        Self::validate_name(name)?;

        let mut tx = self.db.begin().await?;

        let parent_id = Self::resolve_parent(&mut tx, owner.id, parent_id).await?;
        let node =
            NodeRepository::create(&mut tx, &NewNode::folder(name, owner.id).with_parent(parent_id))
                .await?;

        tx.commit().await?;

        info!(node = node.id, owner = owner.id, "folder created");
        Ok(node)
    }

    /// Delete a node. Folders are deleted with their entire subtree.
    ///
    /// The removed byte total is propagated once to the original parent
    /// chain and subtracted from the owner's quota. Blob removal happens
    /// after the metadata commits and is best-effort: failures are logged,
    /// never fatal.
    pub async fn delete(&self, id: i64, caller: &User) -> Result<DeleteResult> {
        let mut tx = self.db.begin().await?;

        let node = NodeRepository::get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can delete this item".to_string(),
            ));
        }

        let subtree = if node.is_folder {
            NodeRepository::collect_subtree(&mut tx, &node).await?
        } else {
            vec![node.clone()]
        };

        let bytes_removed: i64 = subtree
            .iter()
            .filter(|n| !n.is_folder)
            .map(|n| n.size)
            .sum();

        // Children before parents so parent references never dangle
        for n in subtree.iter().rev() {
            NodeRepository::delete(&mut tx, n.id).await?;
        }

        FolderSizeAggregator::propagate(&mut tx, node.parent_id, -bytes_removed).await?;
        QuotaLedger::adjust(&mut tx, caller.id, -bytes_removed).await?;

        tx.commit().await?;

        self.delete_blobs(&subtree).await;

        info!(
            node = node.id,
            owner = caller.id,
            nodes = subtree.len(),
            bytes = bytes_removed,
            "node deleted"
        );

        Ok(DeleteResult {
            nodes_removed: subtree.len(),
            bytes_removed,
        })
    }

    /// Best-effort blob cleanup for deleted file nodes.
    ///
    /// A blob is only unlinked when no surviving node still references its
    /// address (copies share blobs).
    async fn delete_blobs(&self, deleted: &[Node]) {
        let mut conn = match self.db.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "blob cleanup skipped: no database connection");
                return;
            }
        };

        for n in deleted.iter().filter(|n| !n.is_folder) {
            match NodeRepository::blob_reference_count(&mut conn, &n.storage_path).await {
                Ok(0) => {
                    if let Err(e) = self.storage.delete(&n.storage_path) {
                        warn!(
                            node = n.id,
                            storage_path = %n.storage_path,
                            error = %e,
                            "blob deletion failed; orphaned blob left behind"
                        );
                    }
                }
                Ok(_) => {} // still referenced by a copy
                Err(e) => {
                    warn!(
                        storage_path = %n.storage_path,
                        error = %e,
                        "blob reference check failed; skipping blob deletion"
                    );
                }
            }
        }
    }

    /// Rename a node (changes the user-facing name only).
    pub async fn rename(&self, id: i64, caller: &User, new_name: &str) -> Result<Node> {
        Self::validate_name(new_name)?;

        let mut tx = self.db.begin().await?;

        let node = NodeRepository::get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can rename this item".to_string(),
            ));
        }

        NodeRepository::set_original_name(&mut tx, id, new_name).await?;
        let updated = NodeRepository::get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Move a node to another folder (None = root level).
    ///
    /// The moved size leaves the old parent chain and joins the new one;
    /// the two chains may differ above the shared ancestor, so both walks
    /// always run.
    pub async fn move_node(
        &self,
        id: i64,
        caller: &User,
        target_folder_id: Option<i64>,
    ) -> Result<Node> {
        let mut tx = self.db.begin().await?;

        let node = NodeRepository::get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can move this item".to_string(),
            ));
        }

        if let Some(target_id) = target_folder_id {
            if target_id == node.id {
                return Err(LoftError::Validation(
                    "cannot move an item into itself".to_string(),
                ));
            }

            let target = NodeRepository::get_owned(&mut tx, target_id, caller.id)
                .await?
                .filter(|t| t.is_folder)
                .ok_or_else(|| LoftError::Validation("target folder not found".to_string()))?;

            // The parent graph must stay acyclic: the target may not sit
            // inside the moved node's own subtree.
            let mut current = target.parent_id;
            while let Some(ancestor_id) = current {
                if ancestor_id == node.id {
                    return Err(LoftError::Validation(
                        "cannot move a folder into its own subtree".to_string(),
                    ));
                }
                current = NodeRepository::get_by_id(&mut tx, ancestor_id)
                    .await?
                    .and_then(|n| n.parent_id);
            }
        }

        if node.parent_id == target_folder_id {
            return Ok(node);
        }

        FolderSizeAggregator::propagate(&mut tx, node.parent_id, -node.size).await?;
        FolderSizeAggregator::propagate(&mut tx, target_folder_id, node.size).await?;
        NodeRepository::set_parent(&mut tx, node.id, target_folder_id).await?;

        let updated = NodeRepository::get_by_id(&mut tx, node.id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;

        tx.commit().await?;

        info!(node = node.id, target = ?target_folder_id, "node moved");
        Ok(updated)
    }

    /// Copy a node next to the original, with a decorated name.
    ///
    /// Files share the source blob. Folders are copied with their entire
    /// subtree so the copy's size matches its real descendant set. The
    /// copied file bytes are charged to the caller's quota.
    pub async fn copy(&self, id: i64, caller: &User) -> Result<Node> {
        let mut tx = self.db.begin().await?;

        let node = NodeRepository::get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can copy this item".to_string(),
            ));
        }

        let incoming: i64 = if node.is_folder {
            NodeRepository::collect_subtree(&mut tx, &node)
                .await?
                .iter()
                .filter(|n| !n.is_folder)
                .map(|n| n.size)
                .sum()
        } else {
            node.size
        };
        QuotaLedger::check(&mut tx, caller.id, incoming, self.quota_limit).await?;

        let (copy, bytes) =
            copy_subtree(&mut tx, &node, caller.id, node.parent_id, None, true).await?;

        FolderSizeAggregator::propagate(&mut tx, node.parent_id, bytes).await?;
        QuotaLedger::adjust(&mut tx, caller.id, bytes).await?;

        tx.commit().await?;

        info!(source = node.id, copy = copy.id, bytes, "node copied");
        Ok(copy)
    }

    /// Resolve a file to a blob URL for the caller.
    ///
    /// Permitted for the owner, or for the recipient of a saved share copy.
    /// Requires the site base URL and records the access.
    pub async fn download(&self, id: i64, caller: &User) -> Result<DownloadInfo> {
        let mut conn = self.db.acquire().await?;

        let node = NodeRepository::get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("file".to_string()))?;
        if node.is_folder {
            return Err(LoftError::NotFound("file".to_string()));
        }

        let base = SettingsRepository::base_url(&mut conn).await?;

        let permitted = node.owner_id == caller.id
            || (node.is_shared && node.shared_by == Some(caller.id));
        if !permitted {
            return Err(LoftError::Permission(
                "no access to this file".to_string(),
            ));
        }

        NodeRepository::touch_accessed(&mut conn, node.id).await?;

        Ok(DownloadInfo {
            url: format!("{base}/blobs/{}", node.storage_path),
            filename: node.original_name,
        })
    }

    /// Resolve a previewable file (image/video/audio/PDF) to a blob URL.
    pub async fn preview(&self, id: i64, caller: &User) -> Result<PreviewInfo> {
        let mut conn = self.db.acquire().await?;

        let node = NodeRepository::get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("file".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "no access to this file".to_string(),
            ));
        }

        let base = SettingsRepository::base_url(&mut conn).await?;

        if !node.is_previewable() {
            return Err(LoftError::Validation(
                "preview is not supported for this file type".to_string(),
            ));
        }

        Ok(PreviewInfo {
            url: format!("{base}/blobs/{}", node.storage_path),
            mime_type: node.mime_type,
        })
    }

    /// Read a text-like file's content.
    pub async fn text_content(&self, id: i64, caller: &User) -> Result<String> {
        let mut conn = self.db.acquire().await?;

        let node = NodeRepository::get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("file".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "no access to this file".to_string(),
            ));
        }
        if !node.is_text() {
            return Err(LoftError::Validation("not a text file".to_string()));
        }

        let bytes = self.storage.load(&node.storage_path)?;
        String::from_utf8(bytes)
            .map_err(|_| LoftError::Validation("file is not valid UTF-8".to_string()))
    }

    /// List a user's items under a folder (None = root level), newest first.
    pub async fn list(&self, owner: &User, parent_id: Option<i64>) -> Result<Vec<Node>> {
        let mut conn = self.db.acquire().await?;
        NodeRepository::list_children(&mut conn, owner.id, parent_id).await
    }

    /// Case-insensitive substring search over a user's items.
    pub async fn search(&self, owner: &User, keyword: &str) -> Result<Vec<Node>> {
        let mut conn = self.db.acquire().await?;
        NodeRepository::search(&mut conn, owner.id, keyword).await
    }

    /// A user's most recently accessed files.
    pub async fn recent(&self, owner: &User) -> Result<Vec<Node>> {
        let mut conn = self.db.acquire().await?;
        NodeRepository::list_recent(&mut conn, owner.id, RECENT_LIMIT).await
    }

    /// Shared items visible to a user.
    pub async fn shared(&self, owner: &User) -> Result<Vec<Node>> {
        let mut conn = self.db.acquire().await?;
        NodeRepository::list_shared_with(&mut conn, owner.id).await
    }

    /// Repair pass: recompute folder sizes and the quota counter for a user.
    ///
    /// Returns the number of corrected folders and the recomputed usage.
    pub async fn reconcile(&self, owner: &User) -> Result<(usize, i64)> {
        let mut tx = self.db.begin().await?;
        let corrected = FolderSizeAggregator::reconcile(&mut tx, owner.id).await?;
        let usage = QuotaLedger::reconcile(&mut tx, owner.id).await?;
        tx.commit().await?;
        Ok((corrected, usage))
    }
}

/// Copy `source` (and, for folders, its entire subtree) under `parent_id`
/// for `owner_id`. Blob addresses are shared with the source. Returns the
/// new root node and the total file bytes copied.
///
/// Runs entirely on the caller's connection so it participates in the
/// caller's transaction.
pub(crate) async fn copy_subtree(
    conn: &mut SqliteConnection,
    source: &Node,
    owner_id: i64,
    parent_id: Option<i64>,
    shared_by: Option<i64>,
    decorate: bool,
) -> Result<(Node, i64)> {
    let (name, original_name) = if decorate {
        (copy_name(&source.name), copy_name(&source.original_name))
    } else {
        (source.name.clone(), source.original_name.clone())
    };

    let new_root = NewNode {
        name,
        original_name,
        is_folder: source.is_folder,
        size: source.size,
        mime_type: source.mime_type.clone(),
        owner_id,
        parent_id,
        storage_path: source.storage_path.clone(),
        is_shared: shared_by.is_some(),
        shared_by,
    };
    let root = NodeRepository::create(conn, &new_root).await?;

    let mut bytes = if source.is_folder { 0 } else { source.size };

    if source.is_folder {
        // Walk the source subtree breadth-first, mapping each source folder
        // to its freshly created copy.
        let mut queue = VecDeque::from([(source.id, root.id)]);
        while let Some((src_id, dst_id)) = queue.pop_front() {
            for child in NodeRepository::children_of(conn, src_id).await? {
                let child_copy = NewNode {
                    name: child.name.clone(),
                    original_name: child.original_name.clone(),
                    is_folder: child.is_folder,
                    size: child.size,
                    mime_type: child.mime_type.clone(),
                    owner_id,
                    parent_id: Some(dst_id),
                    storage_path: child.storage_path.clone(),
                    is_shared: false,
                    shared_by: None,
                };
                let created = NodeRepository::create(conn, &child_copy).await?;
                if child.is_folder {
                    queue.push_back((child.id, created.id));
                } else {
                    bytes += child.size;
                }
            }
        }
    }

    Ok((root, bytes))
}
