//! Site settings for Loft.
//!
//! A single-row settings document holds the site title and the outbound
//! base URL. The base URL is the external precondition behind every
//! operation that hands out a blob URL: uploads, downloads and previews
//! refuse to run until an administrator has configured it.

use sqlx::SqliteConnection;
use tracing::info;

use crate::db::{Database, User};
use crate::{LoftError, Result};

/// The persisted site settings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SiteSettings {
    /// Site display title.
    pub site_title: String,
    /// Outbound base URL ('' = unconfigured).
    pub site_url: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Fields to change on the settings row.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    /// New site title.
    pub site_title: Option<String>,
    /// New base URL.
    pub site_url: Option<String>,
}

impl SettingsUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the site title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }

    /// Set the base URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }
}

/// Repository for the settings singleton.
pub struct SettingsRepository;

impl SettingsRepository {
    /// Ensure the settings row exists (called once at startup).
    pub async fn initialize(conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO settings (id) VALUES (1)")
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Get the current settings.
    pub async fn get(conn: &mut SqliteConnection) -> Result<SiteSettings> {
        let settings = sqlx::query_as::<_, SiteSettings>(
            "SELECT site_title, site_url, updated_at FROM settings WHERE id = 1",
        )
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| LoftError::NotFound("settings".to_string()))?;

        Ok(settings)
    }

    /// The configured base URL, without a trailing slash.
    ///
    /// Fails with a configuration error while the URL is unset.
    pub async fn base_url(conn: &mut SqliteConnection) -> Result<String> {
        let settings = Self::get(conn).await?;
        if settings.site_url.is_empty() {
            return Err(LoftError::Config(
                "site URL is not configured".to_string(),
            ));
        }
        Ok(settings.site_url.trim_end_matches('/').to_string())
    }
}

/// Update the site settings. Administrators only.
pub async fn update_settings(
    db: &Database,
    caller: &User,
    update: SettingsUpdate,
) -> Result<SiteSettings> {
    if !caller.is_admin() {
        return Err(LoftError::Permission(
            "administrator role required".to_string(),
        ));
    }

    if let Some(ref url) = update.site_url {
        if !url.is_empty() {
            url::Url::parse(url)
                .map_err(|e| LoftError::Validation(format!("invalid site URL: {e}")))?;
        }
    }

    let mut tx = db.begin().await?;

    SettingsRepository::initialize(&mut tx).await?;
    if let Some(ref title) = update.site_title {
        sqlx::query("UPDATE settings SET site_title = ?, updated_at = datetime('now') WHERE id = 1")
            .bind(title)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(ref site_url) = update.site_url {
        sqlx::query("UPDATE settings SET site_url = ?, updated_at = datetime('now') WHERE id = 1")
            .bind(site_url)
            .execute(&mut *tx)
            .await?;
    }

    let settings = SettingsRepository::get(&mut tx).await?;
    tx.commit().await?;

    info!(site_url = %settings.site_url, "site settings updated");

    Ok(settings)
}
