use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::Id;

/// A label owned by one user, or shared when `user_id` is absent.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Id,
    pub name: String,
    pub color: Option<String>,
    pub user_id: Option<Id>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelFields {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    #[serde(flatten)]
    pub fields: LabelFields,
    pub user_id: Option<Id>,
    /// Admin-only: create without an owner.
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditLabel {
    pub id: Id,
    #[serde(flatten)]
    pub fields: LabelFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelFilter {
    #[serde(rename = "user")]
    pub user_id: Option<Id>,
    #[serde(rename = "job")]
    pub job_id: Option<Id>,
    #[serde(rename = "q")]
    pub search: Option<String>,
}

/// One job-to-label assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobLabel {
    pub job_id: Id,
    pub label_id: Id,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JobLabelFilter {
    pub job_id: Option<Id>,
    pub label_id: Option<Id>,
}
