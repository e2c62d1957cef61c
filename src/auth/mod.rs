//! Account management module for Loft.
//!
//! This module provides:
//! - Input validation for registration
//! - Argon2id password hashing
//! - Registration with the first-account-becomes-admin bootstrap
//! - Login authentication

mod login;
mod password;
mod registration;
mod validation;

pub use login::authenticate;
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use validation::{
    validate_email, validate_registration, validate_username, ValidationError,
    MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH,
};
