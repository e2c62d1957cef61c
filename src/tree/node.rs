//! Node model for the Loft file tree.

use super::{COPY_SUFFIX, FOLDER_MIME_TYPE};

/// A node in the file tree: a file or a folder.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Node {
    /// Unique node ID.
    pub id: i64,
    /// Stored name (UUID-based for files, the given name for folders).
    pub name: String,
    /// User-facing name, mutable via rename.
    pub original_name: String,
    /// Whether this node is a folder.
    pub is_folder: bool,
    /// Size in bytes. For a folder, the byte sum of all descendant files.
    pub size: i64,
    /// Mime type ("folder" for folders).
    pub mime_type: String,
    /// Owning user ID. Never changes.
    pub owner_id: i64,
    /// Parent folder ID (None = root level).
    pub parent_id: Option<i64>,
    /// Blob address (empty for folders).
    pub storage_path: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last access timestamp.
    pub last_accessed: String,
    /// Whether this node is currently shared.
    pub is_shared: bool,
    /// For copies saved from another user's share: the sharer's ID.
    pub shared_by: Option<i64>,
}

impl Node {
    /// Whether this node's mime type supports inline preview.
    pub fn is_previewable(&self) -> bool {
        self.mime_type.starts_with("image/")
            || self.mime_type.starts_with("video/")
            || self.mime_type.starts_with("audio/")
            || self.mime_type == "application/pdf"
    }

    /// Whether this node's content can be served as text.
    pub fn is_text(&self) -> bool {
        self.mime_type.starts_with("text/")
            || self.mime_type == "application/json"
            || self.mime_type == "application/javascript"
    }
}

/// Decorate a name for a copied node.
pub fn copy_name(name: &str) -> String {
    format!("{name}{COPY_SUFFIX}")
}

/// Data for creating a new node.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Stored name.
    pub name: String,
    /// User-facing name.
    pub original_name: String,
    /// Whether this node is a folder.
    pub is_folder: bool,
    /// Size in bytes.
    pub size: i64,
    /// Mime type.
    pub mime_type: String,
    /// Owning user ID.
    pub owner_id: i64,
    /// Parent folder ID.
    pub parent_id: Option<i64>,
    /// Blob address (empty for folders).
    pub storage_path: String,
    /// Whether the node starts out shared.
    pub is_shared: bool,
    /// Sharer ID for copies saved from a share.
    pub shared_by: Option<i64>,
}

impl NewNode {
    /// Create a new file node.
    pub fn file(
        name: impl Into<String>,
        original_name: impl Into<String>,
        storage_path: impl Into<String>,
        size: i64,
        mime_type: impl Into<String>,
        owner_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            original_name: original_name.into(),
            is_folder: false,
            size,
            mime_type: mime_type.into(),
            owner_id,
            parent_id: None,
            storage_path: storage_path.into(),
            is_shared: false,
            shared_by: None,
        }
    }

    /// Create a new folder node.
    pub fn folder(name: impl Into<String>, owner_id: i64) -> Self {
        let name = name.into();
        Self {
            name: name.clone(),
            original_name: name,
            is_folder: true,
            size: 0,
            mime_type: FOLDER_MIME_TYPE.to_string(),
            owner_id,
            parent_id: None,
            storage_path: String::new(),
            is_shared: false,
            shared_by: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Mark the node as saved from another user's share.
    pub fn with_shared_by(mut self, sharer_id: i64) -> Self {
        self.is_shared = true;
        self.shared_by = Some(sharer_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(mime: &str) -> Node {
        Node {
            id: 1,
            name: "ab12.txt".to_string(),
            original_name: "notes.txt".to_string(),
            is_folder: false,
            size: 10,
            mime_type: mime.to_string(),
            owner_id: 1,
            parent_id: None,
            storage_path: "ab/ab12.txt".to_string(),
            created_at: "2026-01-01 00:00:00".to_string(),
            last_accessed: "2026-01-01 00:00:00".to_string(),
            is_shared: false,
            shared_by: None,
        }
    }

    #[test]
    fn test_is_previewable() {
        assert!(sample_file("image/png").is_previewable());
        assert!(sample_file("video/mp4").is_previewable());
        assert!(sample_file("audio/mpeg").is_previewable());
        assert!(sample_file("application/pdf").is_previewable());
        assert!(!sample_file("application/zip").is_previewable());
    }

    #[test]
    fn test_is_text() {
        assert!(sample_file("text/plain").is_text());
        assert!(sample_file("application/json").is_text());
        assert!(!sample_file("image/png").is_text());
    }

    #[test]
    fn test_copy_name() {
        assert_eq!(copy_name("notes.txt"), "notes.txt (copy)");
    }

    #[test]
    fn test_new_file_builder() {
        let new_node = NewNode::file("ab12.txt", "notes.txt", "ab/ab12.txt", 10, "text/plain", 7)
            .with_parent(Some(3));

        assert!(!new_node.is_folder);
        assert_eq!(new_node.size, 10);
        assert_eq!(new_node.parent_id, Some(3));
        assert_eq!(new_node.owner_id, 7);
        assert!(!new_node.is_shared);
    }

    #[test]
    fn test_new_folder_builder() {
        let new_node = NewNode::folder("documents", 7);

        assert!(new_node.is_folder);
        assert_eq!(new_node.size, 0);
        assert_eq!(new_node.mime_type, FOLDER_MIME_TYPE);
        assert_eq!(new_node.storage_path, "");
        assert_eq!(new_node.name, new_node.original_name);
    }

    #[test]
    fn test_with_shared_by() {
        let new_node =
            NewNode::file("ab.txt", "a.txt", "ab/ab.txt", 5, "text/plain", 2).with_shared_by(9);
        assert!(new_node.is_shared);
        assert_eq!(new_node.shared_by, Some(9));
    }
}
