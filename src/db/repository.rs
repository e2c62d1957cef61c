//! User repository for Loft.
//!
//! This module provides CRUD operations for users in the database.
//!
//! All functions take a `&mut SqliteConnection` so callers can run them on a
//! plain pool connection or inside an open transaction.

use sqlx::SqliteConnection;

use super::user::{NewUser, User};
use crate::{LoftError, Result};

/// Repository for user CRUD operations.
pub struct UserRepository;

impl UserRepository {
    /// Create a new user in the database.
    ///
    /// The role is assigned inside the INSERT itself: the very first account
    /// becomes 'admin', every later one 'user'. Evaluating the count in the
    /// same statement serializes two simultaneous first registrations under
    /// SQLite's write lock; the UNIQUE constraints on username/email backstop
    /// duplicate submissions.
    ///
    /// Returns the created user with the assigned ID and role.
    pub async fn create(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, password, email, role)
             VALUES (?, ?, ?,
                     CASE WHEN (SELECT COUNT(*) FROM users) = 0
                          THEN 'admin' ELSE 'user' END)",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(&new_user.email)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_rowid();
        Self::get_by_id(conn, id)
            .await?
            .ok_or_else(|| LoftError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, password, email, role, storage_used, created_at, last_login
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(result)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, password, email, role, storage_used, created_at, last_login
             FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(conn)
        .await?;

        Ok(result)
    }

    /// Check whether a username or email is already taken.
    pub async fn username_or_email_exists(
        conn: &mut SqliteConnection,
        username: &str,
        email: &str,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users
             WHERE username = ? COLLATE NOCASE OR email = ? COLLATE NOCASE)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }

    /// Count registered users.
    pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    /// Record a successful login.
    pub async fn touch_last_login(conn: &mut SqliteConnection, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
