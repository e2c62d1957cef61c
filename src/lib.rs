//! Loft - a self-hosted personal cloud drive.
//!
//! Users upload files and folders, organize them in a tree, share items
//! through code-protected expiring links, and track storage usage against
//! a per-user quota.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod quota;
pub mod settings;
pub mod share;
pub mod storage;
pub mod tree;

pub use auth::{
    authenticate, hash_password, register, validate_email, validate_registration,
    validate_username, verify_password, PasswordError, RegistrationError, RegistrationRequest,
    ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository};
pub use error::{LoftError, Result};
pub use quota::QuotaLedger;
pub use settings::{update_settings, SettingsRepository, SettingsUpdate, SiteSettings};
pub use share::{
    generate_code, NewShare, ShareAccess, ShareMetadata, ShareRecord, ShareRepository,
    ShareService, SHARE_CODE_LENGTH, TTL_NEVER,
};
pub use storage::BlobStorage;
pub use tree::{
    DeleteResult, DownloadInfo, FolderSizeAggregator, NewNode, Node, NodeRepository, PreviewInfo,
    TreeService, FOLDER_MIME_TYPE, MAX_NAME_LENGTH, RECENT_LIMIT,
};
