use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Notification,
    Reminder,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Notification => "notification",
            AlertKind::Reminder => "reminder",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub user_id: Id,
    pub vehicle_id: Option<Id>,
    pub job_id: Option<Id>,
    pub task_id: Option<Id>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub alert_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFields {
    pub name: String,
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: AlertKind,
    pub vehicle_id: Option<Id>,
    pub job_id: Option<Id>,
    pub task_id: Option<Id>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub alert_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    #[serde(flatten)]
    pub fields: AlertFields,
    pub user_id: Option<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditAlert {
    pub id: Id,
    #[serde(flatten)]
    pub fields: AlertFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    #[serde(rename = "user")]
    pub user_id: Option<Id>,
    #[serde(rename = "vehicle")]
    pub vehicle_id: Option<Id>,
    #[serde(rename = "job")]
    pub job_id: Option<Id>,
    #[serde(rename = "task")]
    pub task_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: Option<AlertKind>,
    #[serde(rename = "read")]
    pub is_read: Option<bool>,
    /// Only alerts whose `alert_at` has passed.
    #[serde(default)]
    pub due: bool,
    #[serde(rename = "q")]
    pub search: Option<String>,
}
