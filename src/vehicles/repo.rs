use sqlx::SqlitePool;
use tracing::info;

use super::repo_types::{EditVehicle, Vehicle, VehicleFields, VehicleFilter};
use crate::db::{affected, Id};
use crate::error::{AppError, AppResult};
use crate::query::{Join, Predicate, SortColumns, SortKey, StatementParts};

const SELECT: &str = "SELECT v.* FROM vehicle AS v";
const BY_JOB: Join = Join::new("JOIN job AS j ON j.vehicle_id = v.id");
const SEARCH: &[&str] = &["v.name", "v.description", "v.make", "v.model", "v.trim"];
const SORT: SortColumns = SortColumns {
    name: "v.name",
    created_at: "v.created_at",
    updated_at: "v.updated_at",
    completed_at: None,
};

fn check(fields: &VehicleFields) -> AppResult<()> {
    if fields.name.trim().is_empty() {
        return Err(AppError::Validation("vehicle name is required".into()));
    }
    if fields.odometer.is_some_and(|o| o < 0) {
        return Err(AppError::Validation("odometer cannot be negative".into()));
    }
    Ok(())
}

impl Vehicle {
    pub async fn get_by_id(db: &SqlitePool, id: Id) -> AppResult<Vehicle> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("v.id", id))
            .build(SELECT);
        sqlx::query_as::<_, Vehicle>(&sql)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("vehicle"))
    }

    pub async fn list(db: &SqlitePool, filter: &VehicleFilter, sort: SortKey) -> AppResult<Vec<Vehicle>> {
        let mut parts = StatementParts::new();
        if filter.job_id.is_some() {
            parts.join(BY_JOB);
        }
        parts
            .filter_opt("v.user_id", filter.user_id)
            .filter_opt("j.id", filter.job_id)
            .search(SEARCH, filter.search.as_deref())
            .sort(SORT.resolve(sort));
        Ok(sqlx::query_as::<_, Vehicle>(&parts.build(SELECT))
            .fetch_all(db)
            .await?)
    }

    pub async fn create(db: &SqlitePool, fields: &VehicleFields, owner: Id) -> AppResult<Id> {
        check(fields)?;
        let id = sqlx::query(
            "INSERT INTO vehicle (name, description, type, is_metric, vin, year, make, model, \
             trim, odometer, user_id) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.name.trim())
        .bind(&fields.description)
        .bind(&fields.kind)
        .bind(fields.is_metric)
        .bind(&fields.vin)
        .bind(fields.year)
        .bind(&fields.make)
        .bind(&fields.model)
        .bind(&fields.trim)
        .bind(fields.odometer)
        .bind(owner)
        .execute(db)
        .await?
        .last_insert_rowid();
        info!(vehicle_id = id, user_id = owner, "vehicle created");
        Ok(id)
    }

    pub async fn update(db: &SqlitePool, edit: &EditVehicle, owner: Option<Id>) -> AppResult<u64> {
        check(&edit.fields)?;
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", edit.id))
            .filter_opt("user_id", owner)
            .build(
                "UPDATE vehicle SET name = ?, description = ?, type = ?, is_metric = ?, vin = ?, \
                 year = ?, make = ?, model = ?, trim = ?, odometer = ?, \
                 updated_at = CURRENT_TIMESTAMP",
            );
        let f = &edit.fields;
        let result = sqlx::query(&sql)
            .bind(f.name.trim())
            .bind(&f.description)
            .bind(&f.kind)
            .bind(f.is_metric)
            .bind(&f.vin)
            .bind(f.year)
            .bind(&f.make)
            .bind(&f.model)
            .bind(&f.trim)
            .bind(f.odometer)
            .execute(db)
            .await?;
        affected(result)
    }

    /// Removes the vehicle row only. Use [`crate::cascade::delete_vehicle`]
    /// to also remove its jobs.
    pub async fn delete(db: &SqlitePool, id: Id, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("user_id", owner)
            .build("DELETE FROM vehicle");
        affected(sqlx::query(&sql).execute(db).await?)
    }
}
