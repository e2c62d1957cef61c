//! Database schema and migrations for Loft.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - users table
    r#"
-- Users table for authentication and storage accounting
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password      TEXT NOT NULL,                   -- Argon2 hash
    email         TEXT NOT NULL UNIQUE,
    role          TEXT NOT NULL DEFAULT 'user',    -- 'admin', 'user'
    storage_used  INTEGER NOT NULL DEFAULT 0,      -- quota ledger, bytes
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    last_login    TEXT
);

CREATE INDEX idx_users_username ON users(username);
"#,
    // v2: Nodes table - the file/folder tree
    r#"
-- File and folder records. A folder's size is the byte sum of all
-- descendant files and is maintained by the mutation engine.
CREATE TABLE nodes (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,                   -- stored name
    original_name TEXT NOT NULL,                   -- user-facing name
    is_folder     INTEGER NOT NULL DEFAULT 0,
    size          INTEGER NOT NULL DEFAULT 0,
    mime_type     TEXT NOT NULL,
    owner_id      INTEGER NOT NULL REFERENCES users(id),
    parent_id     INTEGER REFERENCES nodes(id),    -- NULL = root level
    storage_path  TEXT NOT NULL DEFAULT '',        -- blob address, '' for folders
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    last_accessed TEXT NOT NULL DEFAULT (datetime('now')),
    is_shared     INTEGER NOT NULL DEFAULT 0,
    shared_by     INTEGER REFERENCES users(id)
);

CREATE INDEX idx_nodes_owner_parent ON nodes(owner_id, parent_id);
CREATE INDEX idx_nodes_original_name ON nodes(original_name COLLATE NOCASE);
CREATE INDEX idx_nodes_storage_path ON nodes(storage_path);
"#,
    // v3: Shares table
    r#"
-- Share records: a code-protected, optionally expiring grant on a node.
CREATE TABLE shares (
    id          TEXT PRIMARY KEY,                  -- UUID v4
    node_id     INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    owner_id    INTEGER NOT NULL REFERENCES users(id),
    code        TEXT NOT NULL,
    expire_time TEXT,                              -- NULL = never expires
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_shares_node_id ON shares(node_id);
"#,
    // v4: Site settings singleton
    r#"
-- Single-row site settings document
CREATE TABLE settings (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    site_title TEXT NOT NULL DEFAULT 'Loft',
    site_url   TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_users_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE users"));
        assert!(first.contains("username"));
        assert!(first.contains("storage_used"));
    }

    #[test]
    fn test_nodes_migration_columns() {
        let nodes = MIGRATIONS[1];
        assert!(nodes.contains("CREATE TABLE nodes"));
        assert!(nodes.contains("original_name"));
        assert!(nodes.contains("parent_id"));
        assert!(nodes.contains("storage_path"));
        assert!(nodes.contains("is_shared"));
    }

    #[test]
    fn test_shares_migration_columns() {
        let shares = MIGRATIONS[2];
        assert!(shares.contains("CREATE TABLE shares"));
        assert!(shares.contains("expire_time"));
        assert!(shares.contains("code"));
    }

    #[test]
    fn test_settings_migration_is_singleton() {
        let settings = MIGRATIONS[3];
        assert!(settings.contains("CREATE TABLE settings"));
        assert!(settings.contains("CHECK (id = 1)"));
    }
}
