//! Blob storage for Loft.
//!
//! This module provides physical file storage:
//! - UUID-based blob naming
//! - Directory sharding by first 2 characters of the UUID
//! - Save, load, and delete operations
//!
//! The blob address returned by [`BlobStorage::save`] is the sharded
//! relative path (`ab/ab12....ext`). Nodes persist that address in
//! `storage_path` and it is what download URLs append to the site base URL.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{LoftError, Result};

/// Blob storage service backed by the local filesystem.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890.bin
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct BlobStorage {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl BlobStorage {
    /// Create a new BlobStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .map_err(|e| LoftError::Storage(format!("create storage dir: {e}")))?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content under a new UUID-based name.
    ///
    /// # Arguments
    ///
    /// * `content` - The blob content to save
    /// * `original_name` - The original filename (used to extract extension)
    ///
    /// # Returns
    ///
    /// The blob address (`shard/uuid.extension`).
    pub fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let stored_name = Self::generate_stored_name(original_name);
        let shard = Self::shard_of(&stored_name);
        let storage_path = format!("{shard}/{stored_name}");

        let file_path = self.base_path.join(&storage_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LoftError::Storage(format!("create shard dir: {e}")))?;
        }
        fs::write(&file_path, content)
            .map_err(|e| LoftError::Storage(format!("write blob: {e}")))?;

        Ok(storage_path)
    }

    /// Load a blob by its address.
    pub fn load(&self, storage_path: &str) -> Result<Vec<u8>> {
        let file_path = self.base_path.join(storage_path);

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LoftError::NotFound(format!("blob {storage_path}")))
            }
            Err(e) => Err(LoftError::Storage(format!("read blob: {e}"))),
        }
    }

    /// Delete a blob by its address.
    ///
    /// # Returns
    ///
    /// `true` if the blob was deleted, `false` if it didn't exist.
    pub fn delete(&self, storage_path: &str) -> Result<bool> {
        let file_path = self.base_path.join(storage_path);

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LoftError::Storage(format!("delete blob: {e}"))),
        }
    }

    /// Check if a blob exists.
    pub fn exists(&self, storage_path: &str) -> bool {
        self.base_path.join(storage_path).exists()
    }

    /// Get the size of a stored blob.
    pub fn file_size(&self, storage_path: &str) -> Result<u64> {
        let file_path = self.base_path.join(storage_path);

        match fs::metadata(&file_path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LoftError::NotFound(format!("blob {storage_path}")))
            }
            Err(e) => Err(LoftError::Storage(format!("stat blob: {e}"))),
        }
    }

    /// Generate a new UUID-based stored name with the extension of the
    /// original filename ("bin" if it has none).
    pub fn generate_stored_name(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }

    /// Shard directory for a stored name: its first 2 characters.
    fn shard_of(stored_name: &str) -> &str {
        if stored_name.len() >= 2 {
            &stored_name[..2]
        } else {
            stored_name
        }
    }

    /// Extract the file extension from a filename.
    ///
    /// Returns "bin" if no extension is found.
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, BlobStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("blobs");

        assert!(!storage_path.exists());

        let storage = BlobStorage::new(&storage_path).unwrap();

        assert!(storage_path.exists());
        assert_eq!(storage.base_path(), storage_path);
    }

    #[test]
    fn test_save_and_load() {
        let (_temp_dir, storage) = setup_storage();
        let content = b"Hello, World!";

        let storage_path = storage.save(content, "test.txt").unwrap();

        assert!(storage_path.ends_with(".txt"));
        // Address is sharded: "ab/ab....txt"
        assert_eq!(&storage_path[2..3], "/");
        assert!(storage_path.starts_with(&storage_path[3..5]));

        let loaded = storage.load(&storage_path).unwrap();
        assert_eq!(loaded, content);
    }

    #[test]
    fn test_save_extracts_extension() {
        let (_temp_dir, storage) = setup_storage();

        let path = storage.save(b"data", "document.pdf").unwrap();
        assert!(path.ends_with(".pdf"));

        let path = storage.save(b"data", "no_extension").unwrap();
        assert!(path.ends_with(".bin"));
    }

    #[test]
    fn test_load_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let result = storage.load("ab/nonexistent.txt");

        assert!(matches!(result, Err(LoftError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = setup_storage();

        let storage_path = storage.save(b"to delete", "delete.txt").unwrap();
        assert!(storage.exists(&storage_path));

        let deleted = storage.delete(&storage_path).unwrap();
        assert!(deleted);
        assert!(!storage.exists(&storage_path));
    }

    #[test]
    fn test_delete_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let deleted = storage.delete("ab/nonexistent.txt").unwrap();
        assert!(!deleted);
    }

    #[test]
    fn test_file_size() {
        let (_temp_dir, storage) = setup_storage();
        let content = b"Hello, World!";

        let storage_path = storage.save(content, "test.txt").unwrap();

        let size = storage.file_size(&storage_path).unwrap();
        assert_eq!(size, content.len() as u64);
    }

    #[test]
    fn test_file_size_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let result = storage.file_size("ab/nonexistent.txt");
        assert!(matches!(result, Err(LoftError::NotFound(_))));
    }

    #[test]
    fn test_generate_stored_name() {
        let name1 = BlobStorage::generate_stored_name("test.txt");
        let name2 = BlobStorage::generate_stored_name("test.txt");

        // Should generate unique names
        assert_ne!(name1, name2);

        // Should preserve extension
        assert!(name1.ends_with(".txt"));

        // Should be valid UUID format (36 chars + . + extension)
        assert!(name1.len() > 36);
    }

    #[test]
    fn test_binary_content() {
        let (_temp_dir, storage) = setup_storage();

        let content: Vec<u8> = (0..=255).collect();

        let storage_path = storage.save(&content, "binary.bin").unwrap();
        let loaded = storage.load(&storage_path).unwrap();

        assert_eq!(loaded, content);
    }

    #[test]
    fn test_unicode_original_name() {
        let (_temp_dir, storage) = setup_storage();

        let storage_path = storage.save(b"data", "日本語ファイル.txt").unwrap();
        assert!(storage_path.ends_with(".txt"));
    }
}
