//! User registration for Loft.

use thiserror::Error;
use tracing::info;

use crate::auth::password::{hash_password, PasswordError};
use crate::auth::validation::{validate_registration, ValidationError};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::LoftError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Username or email already exists.
    #[error("username or email already in use")]
    AlreadyExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<RegistrationError> for LoftError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Validation(v) => LoftError::Validation(v.to_string()),
            RegistrationError::AlreadyExists => LoftError::Validation(e.to_string()),
            RegistrationError::Password(p) => LoftError::Validation(p.to_string()),
            RegistrationError::Database(d) => LoftError::Database(d),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username (4-16 alphanumeric + underscore).
    pub username: String,
    /// Password (8-128 characters).
    pub password: String,
    /// Email address.
    pub email: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: email.into(),
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks that the username and email are free
/// 3. Hashes the password
/// 4. Creates the user
///
/// The uniqueness check and the insert run on one transaction. The first
/// account ever created becomes the administrator; the role is computed
/// inside the INSERT statement itself so two racing first registrations
/// cannot both claim it (see `UserRepository::create`).
pub async fn register(
    db: &Database,
    request: RegistrationRequest,
) -> std::result::Result<User, RegistrationError> {
    validate_registration(&request.username, &request.password, &request.email)?;

    let password_hash = hash_password(&request.password)?;

    let mut tx = db
        .begin()
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;

    let taken =
        UserRepository::username_or_email_exists(&mut tx, &request.username, &request.email)
            .await
            .map_err(|e| RegistrationError::Database(e.to_string()))?;
    if taken {
        return Err(RegistrationError::AlreadyExists);
    }

    let new_user = NewUser::new(&request.username, password_hash, &request.email);
    let user = UserRepository::create(&mut tx, &new_user)
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| RegistrationError::Database(e.to_string()))?;

    info!(
        username = %user.username,
        role = %user.role,
        "registered new user"
    );

    Ok(user)
}
