use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::Id;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub is_template: bool,
    pub is_complete: bool,
    pub vehicle_id: Option<Id>,
    pub user_id: Id,
    /// Template or previous occurrence this job was created from.
    pub origin_job_id: Option<Id>,
    pub repeats: bool,
    pub odo_interval: Option<i64>,
    pub time_interval: Option<i64>,
    pub time_interval_unit: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFields {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub is_template: bool,
    pub vehicle_id: Option<Id>,
    pub origin_job_id: Option<Id>,
    #[serde(default)]
    pub repeats: bool,
    pub odo_interval: Option<i64>,
    pub time_interval: Option<i64>,
    pub time_interval_unit: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[serde(flatten)]
    pub fields: JobFields,
    pub user_id: Option<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditJob {
    pub id: Id,
    #[serde(flatten)]
    pub fields: JobFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    #[serde(rename = "user")]
    pub user_id: Option<Id>,
    #[serde(rename = "vehicle")]
    pub vehicle_id: Option<Id>,
    #[serde(rename = "template")]
    pub is_template: Option<bool>,
    #[serde(rename = "complete")]
    pub is_complete: Option<bool>,
    #[serde(rename = "label")]
    pub label_id: Option<Id>,
    #[serde(rename = "q")]
    pub search: Option<String>,
}
