use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::Id;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub is_complete: bool,
    pub job_id: Id,
    pub part_name: Option<String>,
    pub part_link: Option<String>,
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
pub struct TaskFields {
    pub name: String,
    pub description: Option<String>,
    pub part_name: Option<String>,
    pub part_link: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditTask {
    pub id: Id,
    #[serde(flatten)]
    pub fields: TaskFields,
}

/// Tasks are always listed within one job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(skip)]
    pub job_id: Id,
    #[serde(rename = "complete")]
    pub is_complete: Option<bool>,
    #[serde(rename = "q")]
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn for_job(job_id: Id) -> Self {
        Self {
            job_id,
            ..Default::default()
        }
    }
}
