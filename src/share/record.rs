//! Share record model for Loft.

use rand::distr::{Alphanumeric, SampleString};

use crate::datetime;

use super::SHARE_CODE_LENGTH;

/// A share record: a code-protected grant on a node.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShareRecord {
    /// Share ID (UUID v4, non-enumerable).
    pub id: String,
    /// The shared node.
    pub node_id: i64,
    /// The sharing user.
    pub owner_id: i64,
    /// Access code required to unlock the content.
    pub code: String,
    /// Expiry timestamp (None = never expires).
    pub expire_time: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl ShareRecord {
    /// Whether this share is past its expiry time.
    ///
    /// Re-evaluated on every access; a share with no expiry never expires.
    pub fn is_expired(&self) -> bool {
        match &self.expire_time {
            Some(expire_time) => datetime::is_past(expire_time),
            None => false,
        }
    }
}

/// Data for creating a new share record.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// The node to share.
    pub node_id: i64,
    /// The sharing user.
    pub owner_id: i64,
    /// Access code.
    pub code: String,
    /// Expiry timestamp (None = never expires).
    pub expire_time: Option<String>,
}

impl NewShare {
    /// Create a new share with no expiry.
    pub fn new(node_id: i64, owner_id: i64, code: impl Into<String>) -> Self {
        Self {
            node_id,
            owner_id,
            code: code.into(),
            expire_time: None,
        }
    }

    /// Set an explicit expiry timestamp.
    pub fn with_expire_time(mut self, expire_time: impl Into<String>) -> Self {
        self.expire_time = Some(expire_time.into());
        self
    }
}

/// Generate a random alphanumeric access code.
pub fn generate_code() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SHARE_CODE_LENGTH)
}
