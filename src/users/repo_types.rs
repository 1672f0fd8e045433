use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::Id;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Row values for a new user. The hash is computed before this is built.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: bool,
}

/// Editable profile fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUser {
    pub id: Id,
    pub username: String,
    pub email: Option<String>,
    pub description: Option<String>,
    /// Only honoured for admin callers.
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    #[serde(rename = "admin")]
    pub is_admin: Option<bool>,
    #[serde(rename = "vehicle")]
    pub vehicle_id: Option<Id>,
    #[serde(rename = "job")]
    pub job_id: Option<Id>,
    #[serde(rename = "q")]
    pub search: Option<String>,
}
