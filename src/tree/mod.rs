//! File tree module for Loft.
//!
//! This module implements the file/folder tree:
//! - Node model and repository
//! - Folder size aggregation up the ancestor chain
//! - Tree mutations (upload, folder create, delete, rename, move, copy)
//!   with quota accounting

mod aggregate;
mod node;
mod repository;
mod service;

pub use aggregate::FolderSizeAggregator;
pub use node::{NewNode, Node};
pub use repository::NodeRepository;
pub use service::{DeleteResult, DownloadInfo, PreviewInfo, TreeService};

pub(crate) use service::copy_subtree;

/// Maximum length for a file or folder name (in characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// Suffix appended to the names of copied nodes.
pub const COPY_SUFFIX: &str = " (copy)";

/// Number of entries returned by the recent-files listing.
pub const RECENT_LIMIT: i64 = 20;

/// Mime type recorded for folder nodes.
pub const FOLDER_MIME_TYPE: &str = "folder";
