//! Share manager for Loft.
//!
//! A share moves from active to expired purely by the clock: validity is
//! re-derived from `expire_time` on every access (no background sweep, no
//! stored state). Both the download and save-to-mine paths re-check the
//! access code and expiry at use.

use sqlx::SqliteConnection;
use tracing::info;

use crate::datetime;
use crate::db::{Database, User, UserRepository};
use crate::quota::QuotaLedger;
use crate::settings::SettingsRepository;
use crate::tree::{copy_subtree, DownloadInfo, Node, NodeRepository};
use crate::{LoftError, Result};

use super::record::{NewShare, ShareRecord};
use super::repository::ShareRepository;
use super::TTL_NEVER;

/// A share read model: the node, its owner's display name and, for folders,
/// the direct children. Never includes the access code.
#[derive(Debug, Clone)]
pub struct ShareMetadata {
    /// The shared node.
    pub node: Node,
    /// Display name of the sharing user.
    pub owner_name: String,
    /// Direct children when the shared node is a folder.
    pub children: Vec<Node>,
}

/// The unlocked share content returned after code verification.
#[derive(Debug, Clone)]
pub struct ShareAccess {
    /// The shared node.
    pub node: Node,
    /// Display name of the sharing user.
    pub owner_name: String,
}

/// Service for issuing, validating and revoking shares.
pub struct ShareService<'a> {
    db: &'a Database,
    quota_limit: i64,
}

impl<'a> ShareService<'a> {
    /// Create a new ShareService with no quota limit.
    pub fn new(db: &'a Database) -> Self {
        Self { db, quota_limit: 0 }
    }

    /// Set the per-user quota limit in bytes (0 = unlimited), applied when
    /// saving shared content to the caller's own tree.
    pub fn with_quota_limit(mut self, limit: i64) -> Self {
        self.quota_limit = limit;
        self
    }

    /// Create a share for a node.
    ///
    /// `ttl_days` of -1 means the share never expires; any positive value
    /// sets the expiry that many days out.
    pub async fn create_share(
        &self,
        node_id: i64,
        caller: &User,
        code: &str,
        ttl_days: i64,
    ) -> Result<ShareRecord> {
        if code.trim().is_empty() {
            return Err(LoftError::Validation(
                "access code cannot be empty".to_string(),
            ));
        }
        let expire_time = match ttl_days {
            TTL_NEVER => None,
            d if d >= 1 => Some(datetime::days_from_now_string(d)),
            _ => {
                return Err(LoftError::Validation(
                    "share ttl must be a positive number of days or -1".to_string(),
                ))
            }
        };

        let mut tx = self.db.begin().await?;

        let node = NodeRepository::get_by_id(&mut tx, node_id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can share this item".to_string(),
            ));
        }

        let mut new_share = NewShare::new(node.id, caller.id, code);
        if let Some(expire_time) = expire_time {
            new_share = new_share.with_expire_time(expire_time);
        }
        let share = ShareRepository::create(&mut tx, &new_share).await?;

        NodeRepository::set_shared(&mut tx, node.id, true, node.shared_by).await?;

        tx.commit().await?;

        info!(share = %share.id, node = node.id, owner = caller.id, "share created");
        Ok(share)
    }

    /// Load a share and its node, enforcing expiry.
    async fn fetch_valid(
        conn: &mut SqliteConnection,
        share_id: &str,
    ) -> Result<(ShareRecord, Node)> {
        let share = ShareRepository::get_by_id(conn, share_id)
            .await?
            .ok_or_else(|| LoftError::NotFound("share".to_string()))?;
        if share.is_expired() {
            return Err(LoftError::Expired("share".to_string()));
        }
        let node = NodeRepository::get_by_id(conn, share.node_id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        Ok((share, node))
    }

    async fn owner_name(conn: &mut SqliteConnection, owner_id: i64) -> Result<String> {
        let owner = UserRepository::get_by_id(conn, owner_id)
            .await?
            .ok_or_else(|| LoftError::NotFound("user".to_string()))?;
        Ok(owner.username)
    }

    /// Share metadata: the node, the sharer's name and (for folders) the
    /// direct children. Requires no code and reveals none.
    pub async fn metadata(&self, share_id: &str) -> Result<ShareMetadata> {
        let mut conn = self.db.acquire().await?;

        let (share, node) = Self::fetch_valid(&mut conn, share_id).await?;
        let owner_name = Self::owner_name(&mut conn, share.owner_id).await?;

        let children = if node.is_folder {
            NodeRepository::children_of(&mut conn, node.id).await?
        } else {
            Vec::new()
        };

        Ok(ShareMetadata {
            node,
            owner_name,
            children,
        })
    }

    /// Verify an access code against a share.
    pub async fn verify_code(&self, share_id: &str, code: &str) -> Result<ShareAccess> {
        let mut conn = self.db.acquire().await?;

        let (share, node) = Self::fetch_valid(&mut conn, share_id).await?;
        if share.code != code {
            return Err(LoftError::Permission("wrong access code".to_string()));
        }
        let owner_name = Self::owner_name(&mut conn, share.owner_id).await?;

        Ok(ShareAccess { node, owner_name })
    }

    /// Resolve a shared file to a blob URL.
    ///
    /// Expiry and the code are re-checked here; the site base URL must be
    /// configured. Folders have no blob to download.
    pub async fn download(&self, share_id: &str, code: &str) -> Result<DownloadInfo> {
        let mut conn = self.db.acquire().await?;

        let (share, node) = Self::fetch_valid(&mut conn, share_id).await?;
        if share.code != code {
            return Err(LoftError::Permission("wrong access code".to_string()));
        }

        let base = SettingsRepository::base_url(&mut conn).await?;

        if node.is_folder {
            return Err(LoftError::Validation(
                "cannot download a folder".to_string(),
            ));
        }

        NodeRepository::touch_accessed(&mut conn, node.id).await?;

        Ok(DownloadInfo {
            url: format!("{base}/blobs/{}", node.storage_path),
            filename: node.original_name,
        })
    }

    /// Copy shared content into the caller's own root.
    ///
    /// The copy is owned by the caller, records the sharer in `shared_by`,
    /// shares blob addresses with the source, and is charged to the
    /// caller's quota. Folders are copied with their entire subtree.
    pub async fn save_to_mine(&self, share_id: &str, code: &str, caller: &User) -> Result<Node> {
        let mut tx = self.db.begin().await?;

        let (share, node) = Self::fetch_valid(&mut tx, share_id).await?;
        if share.code != code {
            return Err(LoftError::Permission("wrong access code".to_string()));
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

        let (saved, bytes) =
            copy_subtree(&mut tx, &node, caller.id, None, Some(share.owner_id), false).await?;
        QuotaLedger::adjust(&mut tx, caller.id, bytes).await?;

        tx.commit().await?;

        info!(
            share = %share.id,
            node = saved.id,
            user = caller.id,
            bytes,
            "shared content saved"
        );
        Ok(saved)
    }

    /// Stop sharing a node: clear the shared flags and destroy its share
    /// records.
    pub async fn unshare(&self, node_id: i64, caller: &User) -> Result<Node> {
        let mut tx = self.db.begin().await?;

        let node = NodeRepository::get_by_id(&mut tx, node_id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;
        if node.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can unshare this item".to_string(),
            ));
        }

        NodeRepository::set_shared(&mut tx, node.id, false, None).await?;
        let removed = ShareRepository::delete_by_node(&mut tx, node.id).await?;

        let updated = NodeRepository::get_by_id(&mut tx, node.id)
            .await?
            .ok_or_else(|| LoftError::NotFound("node".to_string()))?;

        tx.commit().await?;

        info!(node = node.id, shares_removed = removed, "node unshared");
        Ok(updated)
    }

    /// Revoke a single share record.
    pub async fn revoke(&self, share_id: &str, caller: &User) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let share = ShareRepository::get_by_id(&mut tx, share_id)
            .await?
            .ok_or_else(|| LoftError::NotFound("share".to_string()))?;
        if share.owner_id != caller.id {
            return Err(LoftError::Permission(
                "only the owner can revoke this share".to_string(),
            ));
        }

        ShareRepository::delete(&mut tx, share_id).await?;
        tx.commit().await?;

        info!(share = %share_id, "share revoked");
        Ok(())
    }

    /// List the caller's share records.
    pub async fn list_mine(&self, caller: &User) -> Result<Vec<ShareRecord>> {
        let mut conn = self.db.acquire().await?;
        ShareRepository::list_by_owner(&mut conn, caller.id).await
    }
}
