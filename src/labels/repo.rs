use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::repo_types::{EditLabel, JobLabel, JobLabelFilter, Label, LabelFields, LabelFilter};
use crate::db::{affected, Id};
use crate::error::{AppError, AppResult};
use crate::query::{Join, Predicate, Sort, SortColumns, SortKey, StatementParts};

const SELECT: &str = "SELECT l.* FROM label AS l";
const BY_JOB: Join = Join::new("JOIN job_label AS jl ON jl.label_id = l.id");
const SEARCH: &[&str] = &["l.name"];
const SORT: SortColumns = SortColumns {
    name: "l.name",
    created_at: "l.created_at",
    updated_at: "l.updated_at",
    completed_at: None,
};

const RELATION_SELECT: &str = "SELECT jl.job_id, jl.label_id FROM job_label AS jl";

fn check(fields: &LabelFields) -> AppResult<()> {
    lazy_static! {
        static ref COLOR_RE: Regex = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
    }
    if fields.name.trim().is_empty() {
        return Err(AppError::Validation("label name is required".into()));
    }
    if let Some(color) = fields.color.as_deref() {
        if !COLOR_RE.is_match(color) {
            return Err(AppError::Validation(format!("invalid color {color}")));
        }
    }
    Ok(())
}

impl Label {
    pub async fn get_by_id(db: &SqlitePool, id: Id) -> AppResult<Label> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("l.id", id))
            .build(SELECT);
        sqlx::query_as::<_, Label>(&sql)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("label"))
    }

    pub async fn list(db: &SqlitePool, filter: &LabelFilter, sort: SortKey) -> AppResult<Vec<Label>> {
        let mut parts = StatementParts::new();
        if filter.job_id.is_some() {
            parts.join(BY_JOB);
        }
        parts
            .filter_opt("l.user_id", filter.user_id)
            .filter_opt("jl.job_id", filter.job_id)
            .search(SEARCH, filter.search.as_deref())
            .sort(SORT.resolve(sort));
        Ok(sqlx::query_as::<_, Label>(&parts.build(SELECT))
            .fetch_all(db)
            .await?)
    }

    /// `owner` of `None` creates a shared label.
    pub async fn create(db: &SqlitePool, fields: &LabelFields, owner: Option<Id>) -> AppResult<Id> {
        check(fields)?;
        let id = sqlx::query("INSERT INTO label (name, color, user_id) VALUES (?, ?, ?)")
            .bind(fields.name.trim())
            .bind(&fields.color)
            .bind(owner)
            .execute(db)
            .await?
            .last_insert_rowid();
        info!(label_id = id, user_id = ?owner, "label created");
        Ok(id)
    }

    pub async fn update(db: &SqlitePool, edit: &EditLabel, owner: Option<Id>) -> AppResult<u64> {
        check(&edit.fields)?;
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", edit.id))
            .filter_opt("user_id", owner)
            .build("UPDATE label SET name = ?, color = ?, updated_at = CURRENT_TIMESTAMP");
        let result = sqlx::query(&sql)
            .bind(edit.fields.name.trim())
            .bind(&edit.fields.color)
            .execute(db)
            .await?;
        affected(result)
    }

    /// Removes the label row only. Use [`crate::cascade::delete_label`] to
    /// also drop its assignments.
    pub async fn delete(db: &SqlitePool, id: Id, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("user_id", owner)
            .build("DELETE FROM label");
        affected(sqlx::query(&sql).execute(db).await?)
    }
}

impl JobLabel {
    /// Assignments in insertion order.
    pub async fn list(db: &SqlitePool, filter: &JobLabelFilter) -> AppResult<Vec<JobLabel>> {
        let sql = StatementParts::new()
            .filter_opt("jl.job_id", filter.job_id)
            .filter_opt("jl.label_id", filter.label_id)
            .sort(Sort::asc("jl.rowid"))
            .build(RELATION_SELECT);
        Ok(sqlx::query_as::<_, JobLabel>(&sql).fetch_all(db).await?)
    }

    pub async fn assign(db: &SqlitePool, job_id: Id, label_id: Id) -> AppResult<Id> {
        let id = sqlx::query("INSERT INTO job_label (job_id, label_id) VALUES (?, ?)")
            .bind(job_id)
            .bind(label_id)
            .execute(db)
            .await?
            .last_insert_rowid();
        debug!(job_id, label_id, "label assigned");
        Ok(id)
    }

    pub async fn unassign(db: &SqlitePool, job_id: Id, label_id: Id) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("job_id", job_id))
            .filter(Predicate::eq("label_id", label_id))
            .build("DELETE FROM job_label");
        affected(sqlx::query(&sql).execute(db).await?)
    }
}
