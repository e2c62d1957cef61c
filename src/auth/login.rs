//! Login handling for Loft.

use tracing::info;

use crate::auth::password::verify_password;
use crate::db::{Database, User, UserRepository};
use crate::{LoftError, Result};

/// Authenticate a user by username and password.
///
/// Unknown usernames and wrong passwords produce the same error so the
/// response does not reveal which accounts exist.
pub async fn authenticate(db: &Database, username: &str, password: &str) -> Result<User> {
    let mut conn = db.acquire().await?;

    let user = UserRepository::get_by_username(&mut conn, username)
        .await?
        .ok_or_else(|| LoftError::Auth("invalid username or password".to_string()))?;

    verify_password(password, &user.password)
        .map_err(|_| LoftError::Auth("invalid username or password".to_string()))?;

    UserRepository::touch_last_login(&mut conn, user.id).await?;

    info!(username = %user.username, "user logged in");

    UserRepository::get_by_id(&mut conn, user.id)
        .await?
        .ok_or_else(|| LoftError::NotFound("user".to_string()))
}
