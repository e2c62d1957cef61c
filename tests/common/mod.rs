//! Shared helpers for Loft integration tests.

use loft::{BlobStorage, Database, NewUser, SettingsRepository, User, UserRepository};
use tempfile::TempDir;

/// A database + blob storage pair with the site URL configured.
pub struct TestEnv {
    pub db: Database,
    pub storage: BlobStorage,
    _tmp: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        let db = Database::open_in_memory().await.unwrap();
        let tmp = TempDir::new().unwrap();
        let storage = BlobStorage::new(tmp.path()).unwrap();

        let mut conn = db.acquire().await.unwrap();
        SettingsRepository::initialize(&mut conn).await.unwrap();
        sqlx::query("UPDATE settings SET site_url = 'https://loft.example.com' WHERE id = 1")
            .execute(&mut *conn)
            .await
            .unwrap();

        Self {
            db,
            storage,
            _tmp: tmp,
        }
    }

    /// Create a user directly in the repository (no password hashing cost).
    pub async fn user(&self, username: &str) -> User {
        let mut conn = self.db.acquire().await.unwrap();
        UserRepository::create(
            &mut conn,
            &NewUser::new(username, "hash", format!("{username}@example.com")),
        )
        .await
        .unwrap()
    }

    /// Assert the two cross-entity invariants over the whole database:
    ///
    /// - every folder's size equals the byte sum of all its descendant files
    /// - every user's storage_used equals the byte sum of their files
    pub async fn assert_invariants(&self) {
        let nodes: Vec<(i64, Option<i64>, bool, i64, i64)> = sqlx::query_as(
            "SELECT id, parent_id, is_folder, size, owner_id FROM nodes",
        )
        .fetch_all(self.db.pool())
        .await
        .unwrap();

        let parents: std::collections::HashMap<i64, Option<i64>> =
            nodes.iter().map(|&(id, parent, ..)| (id, parent)).collect();

        let mut expected_folder_sizes: std::collections::HashMap<i64, i64> = nodes
            .iter()
            .filter(|&&(_, _, is_folder, ..)| is_folder)
            .map(|&(id, ..)| (id, 0))
            .collect();
        let mut expected_usage: std::collections::HashMap<i64, i64> =
            std::collections::HashMap::new();

        for &(_, parent, is_folder, size, owner_id) in &nodes {
            if is_folder {
                continue;
            }
            *expected_usage.entry(owner_id).or_insert(0) += size;
            let mut current = parent;
            while let Some(folder_id) = current {
                if let Some(total) = expected_folder_sizes.get_mut(&folder_id) {
                    *total += size;
                }
                current = parents.get(&folder_id).copied().flatten();
            }
        }

        for &(id, _, is_folder, size, _) in &nodes {
            if is_folder {
                assert_eq!(
                    size, expected_folder_sizes[&id],
                    "folder {id} size drifted from its descendant byte sum"
                );
            }
        }

        let users: Vec<(i64, i64)> = sqlx::query_as("SELECT id, storage_used FROM users")
            .fetch_all(self.db.pool())
            .await
            .unwrap();
        for (user_id, storage_used) in users {
            assert_eq!(
                storage_used,
                expected_usage.get(&user_id).copied().unwrap_or(0),
                "user {user_id} quota counter drifted from owned file bytes"
            );
        }
    }
}
