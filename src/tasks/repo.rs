use sqlx::SqlitePool;
use tracing::info;

use super::repo_types::{EditTask, Task, TaskFields, TaskFilter};
use crate::db::{affected, stored_ts, Id};
use crate::error::{AppError, AppResult};
use crate::jobs::Job;
use crate::query::{Predicate, SortColumns, SortKey, StatementParts};

const SELECT: &str = "SELECT t.* FROM task AS t";
const SEARCH: &[&str] = &["t.name", "t.description"];
const SORT: SortColumns = SortColumns {
    name: "t.name",
    created_at: "t.created_at",
    updated_at: "t.updated_at",
    completed_at: Some("t.completed_at"),
};

fn check(fields: &TaskFields) -> AppResult<()> {
    if fields.name.trim().is_empty() {
        return Err(AppError::Validation("task name is required".into()));
    }
    Ok(())
}

// Tasks carry no owner column. Mutations are scoped by their parent job
// instead; handlers confirm the caller owns that job first.
impl Task {
    pub async fn get_by_id(db: &SqlitePool, id: Id) -> AppResult<Task> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("t.id", id))
            .build(SELECT);
        sqlx::query_as::<_, Task>(&sql)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("task"))
    }

    pub async fn list(db: &SqlitePool, filter: &TaskFilter, sort: SortKey) -> AppResult<Vec<Task>> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("t.job_id", filter.job_id))
            .filter_opt("t.is_complete", filter.is_complete)
            .search(SEARCH, filter.search.as_deref())
            .sort(SORT.resolve(sort))
            .build(SELECT);
        Ok(sqlx::query_as::<_, Task>(&sql).fetch_all(db).await?)
    }

    pub async fn create(db: &SqlitePool, job_id: Id, fields: &TaskFields) -> AppResult<Id> {
        check(fields)?;
        match Job::get_by_id(db, job_id).await {
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Validation(format!("job {job_id} does not exist")))
            }
            other => other?,
        };
        let id = sqlx::query(
            "INSERT INTO task (name, description, job_id, part_name, part_link, due_date) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.name.trim())
        .bind(&fields.description)
        .bind(job_id)
        .bind(&fields.part_name)
        .bind(&fields.part_link)
        .bind(fields.due_date.map(stored_ts))
        .execute(db)
        .await?
        .last_insert_rowid();
        info!(task_id = id, job_id, "task created");
        Ok(id)
    }

    pub async fn update(db: &SqlitePool, edit: &EditTask, job_id: Option<Id>) -> AppResult<u64> {
        check(&edit.fields)?;
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", edit.id))
            .filter_opt("job_id", job_id)
            .build(
                "UPDATE task SET name = ?, description = ?, part_name = ?, part_link = ?, \
                 due_date = ?, updated_at = CURRENT_TIMESTAMP",
            );
        let f = &edit.fields;
        let result = sqlx::query(&sql)
            .bind(f.name.trim())
            .bind(&f.description)
            .bind(&f.part_name)
            .bind(&f.part_link)
            .bind(f.due_date.map(stored_ts))
            .execute(db)
            .await?;
        affected(result)
    }

    pub async fn set_complete(db: &SqlitePool, id: Id, complete: bool, job_id: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("job_id", job_id)
            .build(
                "UPDATE task SET is_complete = ?, \
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

    pub async fn delete(db: &SqlitePool, id: Id, job_id: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("job_id", job_id)
            .build("DELETE FROM task");
        affected(sqlx::query(&sql).execute(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::testing::{seed_job, seed_user};

    fn fields(name: &str) -> TaskFields {
        TaskFields {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn tasks_need_an_existing_job() {
        let db = memory_pool().await.unwrap();
        assert!(matches!(
            Task::create(&db, 42, &fields("Drain oil")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn storage_errors_during_the_job_check_surface() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let oil = seed_job(&db, alice, "Oil change", None).await;
        sqlx::query("ALTER TABLE job RENAME TO job_archive").execute(&db).await.unwrap();
        assert!(matches!(
            Task::create(&db, oil, &fields("Drain oil")).await,
            Err(AppError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn list_is_scoped_to_one_job() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let oil = seed_job(&db, alice, "Oil change", None).await;
        let brakes = seed_job(&db, alice, "Brakes", None).await;
        Task::create(&db, oil, &fields("Drain oil")).await.unwrap();
        let filter_id = Task::create(&db, oil, &fields("Swap filter")).await.unwrap();
        Task::create(&db, brakes, &fields("Pads")).await.unwrap();

        let tasks = Task::list(&db, &TaskFilter::for_job(oil), SortKey::Az).await.unwrap();
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Drain oil", "Swap filter"]);

        Task::set_complete(&db, filter_id, true, Some(oil)).await.unwrap();
        let open = TaskFilter { is_complete: Some(false), ..TaskFilter::for_job(oil) };
        assert_eq!(Task::list(&db, &open, SortKey::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mutations_are_scoped_by_parent_job() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let oil = seed_job(&db, alice, "Oil change", None).await;
        let id = Task::create(&db, oil, &fields("Drain oil")).await.unwrap();

        let edit = EditTask { id, fields: fields("Drain old oil") };
        assert!(matches!(Task::update(&db, &edit, Some(oil + 1)).await, Err(AppError::NoRowsAffected)));
        assert_eq!(Task::update(&db, &edit, Some(oil)).await.unwrap(), 1);
        assert_eq!(Task::get_by_id(&db, id).await.unwrap().name, "Drain old oil");
        assert_eq!(Task::delete(&db, id, Some(oil)).await.unwrap(), 1);
        assert!(matches!(Task::get_by_id(&db, id).await, Err(AppError::NotFound("task"))));
    }
}
