use sqlx::SqlitePool;
use tracing::info;

use super::repo_types::{EditUser, NewUser, User, UserFilter};
use crate::db::{affected, Id};
use crate::error::{AppError, AppResult};
use crate::query::{Join, Predicate, SortColumns, SortKey, StatementParts};

const SELECT: &str = "SELECT u.* FROM user AS u";
const BY_VEHICLE: Join = Join::new("JOIN vehicle AS v ON v.user_id = u.id");
const BY_JOB: Join = Join::new("JOIN job AS j ON j.user_id = u.id");
const SEARCH: &[&str] = &["u.username", "u.description"];
const SORT: SortColumns = SortColumns {
    name: "u.username",
    created_at: "u.created_at",
    updated_at: "u.updated_at",
    completed_at: None,
};

impl User {
    pub async fn get_by_id(db: &SqlitePool, id: Id) -> AppResult<User> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("u.id", id))
            .build(SELECT);
        sqlx::query_as::<_, User>(&sql)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn find_by_username(db: &SqlitePool, username: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT u.* FROM user AS u WHERE u.username = ?")
            .bind(username)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn list(db: &SqlitePool, filter: &UserFilter, sort: SortKey) -> AppResult<Vec<User>> {
        let mut parts = StatementParts::new();
        if filter.vehicle_id.is_some() {
            parts.join(BY_VEHICLE);
        }
        if filter.job_id.is_some() {
            parts.join(BY_JOB);
        }
        parts
            .filter_opt("u.is_admin", filter.is_admin)
            .filter_opt("v.id", filter.vehicle_id)
            .filter_opt("j.id", filter.job_id)
            .search(SEARCH, filter.search.as_deref())
            .sort(SORT.resolve(sort));
        let rows = sqlx::query_as::<_, User>(&parts.build(SELECT))
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn create(db: &SqlitePool, new: &NewUser) -> AppResult<Id> {
        let id = sqlx::query(
            "INSERT INTO user (username, email, description, password_hash, is_admin) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.description)
        .bind(&new.password_hash)
        .bind(new.is_admin)
        .execute(db)
        .await?
        .last_insert_rowid();
        info!(user_id = id, username = %new.username, "user created");
        Ok(id)
    }

    /// Users are their own owners, so `owner` scopes by id.
    /// Fails with [`AppError::Validation`] when another user already holds
    /// the requested username.
    pub async fn update(db: &SqlitePool, edit: &EditUser, is_admin: bool, owner: Option<Id>) -> AppResult<u64> {
        match User::find_by_username(db, &edit.username).await {
            Ok(holder) if holder.id != edit.id => {
                return Err(AppError::Validation("username already taken".into()))
            }
            Err(AppError::NotFound(_)) | Ok(_) => {}
            Err(e) => return Err(e),
        }
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", edit.id))
            .filter_opt("id", owner)
            .build(
                "UPDATE user SET username = ?, email = ?, description = ?, is_admin = ?, \
                 updated_at = CURRENT_TIMESTAMP",
            );
        let result = sqlx::query(&sql)
            .bind(&edit.username)
            .bind(&edit.email)
            .bind(&edit.description)
            .bind(is_admin)
            .execute(db)
            .await?;
        affected(result)
    }

    pub async fn set_password(db: &SqlitePool, id: Id, password_hash: &str) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .build("UPDATE user SET password_hash = ?, updated_at = CURRENT_TIMESTAMP");
        let result = sqlx::query(&sql).bind(password_hash).execute(db).await?;
        affected(result)
    }

    pub async fn delete(db: &SqlitePool, id: Id, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("id", owner)
            .build("DELETE FROM user");
        affected(sqlx::query(&sql).execute(db).await?)
    }

    pub async fn any_admin(db: &SqlitePool) -> AppResult<bool> {
        let filter = UserFilter {
            is_admin: Some(true),
            ..Default::default()
        };
        Ok(!Self::list(db, &filter, SortKey::default()).await?.is_empty())
    }
}
