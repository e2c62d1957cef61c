//! Error types for Loft.

use thiserror::Error;

/// Common error type for Loft.
#[derive(Error, Debug)]
pub enum LoftError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from the database
    /// backend. Errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (unknown caller, bad credentials).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied: the entity exists but the caller is not its owner
    /// or lacks the required role.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input or for a structurally invalid
    /// operation (e.g. moving a folder into its own subtree).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A share was accessed past its expiry time.
    #[error("share expired: {0}")]
    Expired(String),

    /// Required external configuration is absent (e.g. site base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Blob storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for LoftError {
    fn from(e: sqlx::Error) -> Self {
        LoftError::Database(e.to_string())
    }
}

/// Result type alias for Loft operations.
pub type Result<T> = std::result::Result<T, LoftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_error_display() {
        let err = LoftError::Permission("not the owner".to_string());
        assert_eq!(err.to_string(), "permission denied: not the owner");
    }

    #[test]
    fn test_validation_error_display() {
        let err = LoftError::Validation("name too long".to_string());
        assert_eq!(err.to_string(), "validation error: name too long");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = LoftError::NotFound("node".to_string());
        assert_eq!(err.to_string(), "node not found");
    }

    #[test]
    fn test_expired_error_display() {
        let err = LoftError::Expired("share".to_string());
        assert_eq!(err.to_string(), "share expired: share");
    }

    #[test]
    fn test_config_error_display() {
        let err = LoftError::Config("site URL is not configured".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: site URL is not configured"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LoftError = io_err.into();
        assert!(matches!(err, LoftError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(LoftError::Auth("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
