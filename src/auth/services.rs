use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::claims::Identity;
use super::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::users::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Resolves a username/password pair to an identity.
///
/// A missing user is [`AppError::NotFound`] and a wrong password is
/// [`AppError::Unauthorized`]. Accounts created without a password sign in
/// on username alone when `allow_passwordless` is set.
pub async fn check_credentials(
    db: &SqlitePool,
    username: &str,
    password: &str,
    allow_passwordless: bool,
) -> AppResult<Identity> {
    let user = User::find_by_username(db, username).await?;
    let identity = Identity {
        id: user.id,
        username: user.username.clone(),
        is_admin: user.is_admin,
    };

    match user.password_hash.as_deref().filter(|h| !h.is_empty()) {
        None if allow_passwordless => {
            warn!(user_id = user.id, "user has no password; accepted on username alone");
            Ok(identity)
        }
        None => Err(AppError::Unauthorized("password login required".into())),
        Some(hash) => {
            if verify_password(password, hash)? {
                debug!(user_id = user.id, "credentials accepted");
                Ok(identity)
            } else {
                warn!(user_id = user.id, "password mismatch");
                Err(AppError::Unauthorized("invalid credentials".into()))
            }
        }
    }
}
