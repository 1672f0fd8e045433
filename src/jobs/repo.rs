use sqlx::SqlitePool;
use tracing::info;

use super::repo_types::{EditJob, Job, JobFields, JobFilter};
use crate::db::{affected, stored_ts, Id};
use crate::error::{AppError, AppResult};
use crate::query::{Join, Predicate, SortColumns, SortKey, StatementParts};
use crate::vehicles::Vehicle;

const SELECT: &str = "SELECT j.* FROM job AS j";
const BY_LABEL: Join = Join::new("JOIN job_label AS jl ON jl.job_id = j.id");
const SEARCH: &[&str] = &["j.name", "j.description", "j.instructions"];
const SORT: SortColumns = SortColumns {
    name: "j.name",
    created_at: "j.created_at",
    updated_at: "j.updated_at",
    completed_at: Some("j.completed_at"),
};
const INTERVAL_UNITS: &[&str] = &["day", "week", "month", "year"];

/// Field rules plus referential checks against vehicle and origin job, both
/// of which must belong to `owner`.
async fn check(db: &SqlitePool, fields: &JobFields, owner: Id) -> AppResult<()> {
    if fields.name.trim().is_empty() {
        return Err(AppError::Validation("job name is required".into()));
    }
    if fields.repeats && fields.odo_interval.is_none() && fields.time_interval.is_none() {
        return Err(AppError::Validation(
            "repeating jobs need an odometer or time interval".into(),
        ));
    }
    if fields.odo_interval.is_some_and(|i| i <= 0) || fields.time_interval.is_some_and(|i| i <= 0) {
        return Err(AppError::Validation("intervals must be positive".into()));
    }
    if fields.time_interval.is_some() {
        match fields.time_interval_unit.as_deref() {
            Some(unit) if INTERVAL_UNITS.contains(&unit) => {}
            _ => {
                return Err(AppError::Validation(format!(
                    "time interval unit must be one of {}",
                    INTERVAL_UNITS.join(", ")
                )))
            }
        }
    }

    if let Some(vehicle_id) = fields.vehicle_id {
        let vehicle = match Vehicle::get_by_id(db, vehicle_id).await {
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Validation(format!("vehicle {vehicle_id} does not exist")))
            }
            other => other?,
        };
        if vehicle.user_id != owner {
            return Err(AppError::Validation(format!(
                "vehicle {vehicle_id} belongs to another user"
            )));
        }
    }
    if let Some(origin) = fields.origin_job_id {
        let origin_job = match Job::get_by_id(db, origin).await {
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Validation(format!("origin job {origin} does not exist")))
            }
            other => other?,
        };
        if origin_job.user_id != owner {
            return Err(AppError::Validation(format!(
                "origin job {origin} belongs to another user"
            )));
        }
    }
    Ok(())
}

impl Job {
    pub async fn get_by_id(db: &SqlitePool, id: Id) -> AppResult<Job> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("j.id", id))
            .build(SELECT);
        sqlx::query_as::<_, Job>(&sql)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("job"))
    }

    pub async fn list(db: &SqlitePool, filter: &JobFilter, sort: SortKey) -> AppResult<Vec<Job>> {
        let mut parts = StatementParts::new();
        if filter.label_id.is_some() {
            parts.join(BY_LABEL);
        }
        parts
            .filter_opt("j.user_id", filter.user_id)
            .filter_opt("j.vehicle_id", filter.vehicle_id)
            .filter_opt("j.is_template", filter.is_template)
            .filter_opt("j.is_complete", filter.is_complete)
            .filter_opt("jl.label_id", filter.label_id)
            .search(SEARCH, filter.search.as_deref())
            .sort(SORT.resolve(sort));
        Ok(sqlx::query_as::<_, Job>(&parts.build(SELECT))
            .fetch_all(db)
            .await?)
    }

    pub async fn create(db: &SqlitePool, fields: &JobFields, owner: Id) -> AppResult<Id> {
        check(db, fields, owner).await?;
        let id = sqlx::query(
            "INSERT INTO job (name, description, instructions, is_template, vehicle_id, user_id, \
             origin_job_id, repeats, odo_interval, time_interval, time_interval_unit, due_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.name.trim())
        .bind(&fields.description)
        .bind(&fields.instructions)
        .bind(fields.is_template)
        .bind(fields.vehicle_id)
        .bind(owner)
        .bind(fields.origin_job_id)
        .bind(fields.repeats)
        .bind(fields.odo_interval)
        .bind(fields.time_interval)
        .bind(&fields.time_interval_unit)
        .bind(fields.due_date.map(stored_ts))
        .execute(db)
        .await?
        .last_insert_rowid();
        info!(job_id = id, user_id = owner, "job created");
        Ok(id)
    }

    /// `job_owner` is who the vehicle reference must belong to. `owner`
    /// scopes the statement and is `None` for admins.
    pub async fn update(db: &SqlitePool, edit: &EditJob, job_owner: Id, owner: Option<Id>) -> AppResult<u64> {
        check(db, &edit.fields, job_owner).await?;
        if edit.fields.origin_job_id == Some(edit.id) {
            return Err(AppError::Validation("a job cannot originate from itself".into()));
        }
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", edit.id))
            .filter_opt("user_id", owner)
            .build(
                "UPDATE job SET name = ?, description = ?, instructions = ?, is_template = ?, \
                 vehicle_id = ?, origin_job_id = ?, repeats = ?, odo_interval = ?, \
                 time_interval = ?, time_interval_unit = ?, due_date = ?, \
                 updated_at = CURRENT_TIMESTAMP",
            );
        let f = &edit.fields;
        let result = sqlx::query(&sql)
            .bind(f.name.trim())
            .bind(&f.description)
            .bind(&f.instructions)
            .bind(f.is_template)
            .bind(f.vehicle_id)
            .bind(f.origin_job_id)
            .bind(f.repeats)
            .bind(f.odo_interval)
            .bind(f.time_interval)
            .bind(&f.time_interval_unit)
            .bind(f.due_date.map(stored_ts))
            .execute(db)
            .await?;
        affected(result)
    }

    /// Marks the job complete (stamping `completed_at`) or reopens it.
    pub async fn set_complete(db: &SqlitePool, id: Id, complete: bool, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("user_id", owner)
            .build(
                "UPDATE job SET is_complete = ?, \
                 completed_at = CASE WHEN ? THEN CURRENT_TIMESTAMP ELSE NULL END, \
                 updated_at = CURRENT_TIMESTAMP",
            );
        let result = sqlx::query(&sql)
            .bind(complete)
            .bind(complete)
            .execute(db)
            .await?;
        affected(result)
    }

    /// Removes the job row only. Use [`crate::cascade::delete_job`] to also
    /// remove its tasks, alerts and label assignments.
    pub async fn delete(db: &SqlitePool, id: Id, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("user_id", owner)
            .build("DELETE FROM job");
        affected(sqlx::query(&sql).execute(db).await?)
    }
}
