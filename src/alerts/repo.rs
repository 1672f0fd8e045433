use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;

use super::repo_types::{Alert, AlertFields, AlertFilter, AlertKind, EditAlert};
use crate::db::{affected, stored_ts, Id};
use crate::error::{AppError, AppResult};
use crate::jobs::Job;
use crate::query::{Cmp, Predicate, SortColumns, SortKey, SqlValue, StatementParts};
use crate::tasks::Task;
use crate::vehicles::Vehicle;

const SELECT: &str = "SELECT a.* FROM alert AS a";
const SEARCH: &[&str] = &["a.name", "a.description"];
const SORT: SortColumns = SortColumns {
    name: "a.name",
    created_at: "a.created_at",
    updated_at: "a.updated_at",
    completed_at: None,
};

fn missing(what: &str, id: Id) -> AppError {
    AppError::Validation(format!("{what} {id} does not exist"))
}

fn foreign(what: &str, id: Id) -> AppError {
    AppError::Validation(format!("{what} {id} belongs to another user"))
}

/// Checks the references against `owner` and returns the fields with
/// `job_id` filled in from the task when only the task was given.
async fn resolve(db: &SqlitePool, fields: &AlertFields, owner: Id) -> AppResult<AlertFields> {
    if fields.name.trim().is_empty() {
        return Err(AppError::Validation("alert name is required".into()));
    }
    if fields.kind == AlertKind::Reminder && fields.alert_at.is_none() {
        return Err(AppError::Validation("reminders need an alert time".into()));
    }

    let mut resolved = fields.clone();
    if let Some(task_id) = fields.task_id {
        let task = match Task::get_by_id(db, task_id).await {
            Err(AppError::NotFound(_)) => return Err(missing("task", task_id)),
            other => other?,
        };
        match fields.job_id {
            Some(job_id) if job_id != task.job_id => {
                return Err(AppError::Validation(format!(
                    "task {task_id} does not belong to job {job_id}"
                )))
            }
            _ => resolved.job_id = Some(task.job_id),
        }
    }
    if let Some(job_id) = resolved.job_id {
        let job = match Job::get_by_id(db, job_id).await {
            Err(AppError::NotFound(_)) => return Err(missing("job", job_id)),
            other => other?,
        };
        if job.user_id != owner {
            return Err(foreign("job", job_id));
        }
    }
    if let Some(vehicle_id) = fields.vehicle_id {
        let vehicle = match Vehicle::get_by_id(db, vehicle_id).await {
            Err(AppError::NotFound(_)) => return Err(missing("vehicle", vehicle_id)),
            other => other?,
        };
        if vehicle.user_id != owner {
            return Err(foreign("vehicle", vehicle_id));
        }
    }
    resolved.name = resolved.name.trim().to_string();
    resolved.alert_at = resolved.alert_at.map(stored_ts);
    Ok(resolved)
}

impl Alert {
    pub async fn get_by_id(db: &SqlitePool, id: Id) -> AppResult<Alert> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("a.id", id))
            .build(SELECT);
        sqlx::query_as::<_, Alert>(&sql)
            .fetch_optional(db)
            .await?
            .ok_or(AppError::NotFound("alert"))
    }

    pub async fn list(db: &SqlitePool, filter: &AlertFilter, sort: SortKey) -> AppResult<Vec<Alert>> {
        let mut parts = StatementParts::new();
        parts
            .filter_opt("a.user_id", filter.user_id)
            .filter_opt("a.vehicle_id", filter.vehicle_id)
            .filter_opt("a.job_id", filter.job_id)
            .filter_opt("a.task_id", filter.task_id)
            .filter_opt("a.type", filter.kind.map(|k| SqlValue::Enum(k.as_str())))
            .filter_opt("a.is_read", filter.is_read);
        if filter.due {
            parts.filter(Predicate::cmp(
                "a.alert_at",
                Cmp::Le,
                stored_ts(OffsetDateTime::now_utc()),
            ));
        }
        parts
            .search(SEARCH, filter.search.as_deref())
            .sort(SORT.resolve(sort));
        Ok(sqlx::query_as::<_, Alert>(&parts.build(SELECT))
            .fetch_all(db)
            .await?)
    }

    pub async fn create(db: &SqlitePool, fields: &AlertFields, owner: Id) -> AppResult<Id> {
        let f = resolve(db, fields, owner).await?;
        let id = sqlx::query(
            "INSERT INTO alert (name, description, type, user_id, vehicle_id, job_id, task_id, \
             alert_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&f.name)
        .bind(&f.description)
        .bind(f.kind)
        .bind(owner)
        .bind(f.vehicle_id)
        .bind(f.job_id)
        .bind(f.task_id)
        .bind(f.alert_at)
        .execute(db)
        .await?
        .last_insert_rowid();
        info!(alert_id = id, user_id = owner, kind = f.kind.as_str(), "alert created");
        Ok(id)
    }

    /// References are checked against `alert_owner`, the user the alert
    /// belongs to, even when an admin makes the edit.
    pub async fn update(
        db: &SqlitePool,
        edit: &EditAlert,
        alert_owner: Id,
        owner: Option<Id>,
    ) -> AppResult<u64> {
        let f = resolve(db, &edit.fields, alert_owner).await?;
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", edit.id))
            .filter_opt("user_id", owner)
            .build(
                "UPDATE alert SET name = ?, description = ?, type = ?, vehicle_id = ?, \
                 job_id = ?, task_id = ?, alert_at = ?, updated_at = CURRENT_TIMESTAMP",
            );
        let result = sqlx::query(&sql)
            .bind(&f.name)
            .bind(&f.description)
            .bind(f.kind)
            .bind(f.vehicle_id)
            .bind(f.job_id)
            .bind(f.task_id)
            .bind(f.alert_at)
            .execute(db)
            .await?;
        affected(result)
    }

    /// Marks the alert read (stamping `read_at`) or unread.
    pub async fn set_read(db: &SqlitePool, id: Id, read: bool, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("user_id", owner)
            .build(
                "UPDATE alert SET is_read = ?, \
                 read_at = CASE WHEN ? THEN CURRENT_TIMESTAMP ELSE NULL END, \
                 updated_at = CURRENT_TIMESTAMP",
            );
        let result = sqlx::query(&sql).bind(read).bind(read).execute(db).await?;
        affected(result)
    }

    pub async fn delete(db: &SqlitePool, id: Id, owner: Option<Id>) -> AppResult<u64> {
        let sql = StatementParts::new()
            .filter(Predicate::eq("id", id))
            .filter_opt("user_id", owner)
            .build("DELETE FROM alert");
        affected(sqlx::query(&sql).execute(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::tasks::TaskFields;
    use crate::cascade;
    use crate::testing::{seed_job, seed_user, seed_vehicle};
    use time::Duration;

    fn fields(name: &str) -> AlertFields {
        AlertFields {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn task_reference_fills_in_its_job() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let job = seed_job(&db, alice, "Oil change", None).await;
        let other = seed_job(&db, alice, "Brakes", None).await;
        let task = Task::create(&db, job, &TaskFields { name: "Drain".into(), ..Default::default() })
            .await
            .unwrap();

        let mut f = fields("Buy oil");
        f.task_id = Some(task);
        let id = Alert::create(&db, &f, alice).await.unwrap();
        assert_eq!(Alert::get_by_id(&db, id).await.unwrap().job_id, Some(job));

        f.job_id = Some(other);
        assert!(matches!(Alert::create(&db, &f, alice).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn reminders_need_a_time() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let mut f = fields("Inspection");
        f.kind = AlertKind::Reminder;
        assert!(matches!(Alert::create(&db, &f, alice).await, Err(AppError::Validation(_))));
        f.alert_at = Some(OffsetDateTime::now_utc());
        let id = Alert::create(&db, &f, alice).await.unwrap();
        assert_eq!(Alert::get_by_id(&db, id).await.unwrap().kind, AlertKind::Reminder);
    }

    #[tokio::test]
    async fn filters_by_type_read_and_due() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let now = OffsetDateTime::now_utc();

        let mut past = fields("Registration");
        past.kind = AlertKind::Reminder;
        past.alert_at = Some(now - Duration::days(1));
        let past_id = Alert::create(&db, &past, alice).await.unwrap();

        let mut future = fields("Tires");
        future.kind = AlertKind::Reminder;
        future.alert_at = Some(now + Duration::days(30));
        Alert::create(&db, &future, alice).await.unwrap();

        let note = Alert::create(&db, &fields("Welcome"), alice).await.unwrap();

        let reminders = AlertFilter { kind: Some(AlertKind::Reminder), ..Default::default() };
        assert_eq!(Alert::list(&db, &reminders, SortKey::default()).await.unwrap().len(), 2);

        let due = AlertFilter { due: true, ..Default::default() };
        let due: Vec<_> = Alert::list(&db, &due, SortKey::default())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(due, vec![past_id]);

        Alert::set_read(&db, note, true, Some(alice)).await.unwrap();
        let unread = AlertFilter { is_read: Some(false), ..Default::default() };
        assert_eq!(Alert::list(&db, &unread, SortKey::default()).await.unwrap().len(), 2);
        assert!(Alert::get_by_id(&db, note).await.unwrap().read_at.is_some());
    }

    #[tokio::test]
    async fn references_must_belong_to_the_alert_owner() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let car = seed_vehicle(&db, alice, "Civic").await;
        let job = seed_job(&db, alice, "Oil change", Some(car)).await;
        let task = Task::create(&db, job, &TaskFields { name: "Drain".into(), ..Default::default() })
            .await
            .unwrap();

        let mut on_job = fields("Snoop");
        on_job.job_id = Some(job);
        assert!(matches!(Alert::create(&db, &on_job, bob).await, Err(AppError::Validation(_))));

        let mut on_task = fields("Snoop");
        on_task.task_id = Some(task);
        assert!(matches!(Alert::create(&db, &on_task, bob).await, Err(AppError::Validation(_))));

        let mut on_vehicle = fields("Snoop");
        on_vehicle.vehicle_id = Some(car);
        assert!(matches!(Alert::create(&db, &on_vehicle, bob).await, Err(AppError::Validation(_))));

        let mine = Alert::create(&db, &fields("Mine"), bob).await.unwrap();
        let edit = EditAlert { id: mine, fields: on_job.clone() };
        assert!(matches!(Alert::update(&db, &edit, bob, None).await, Err(AppError::Validation(_))));

        cascade::delete_job(&db, job, Some(alice)).await.unwrap();
        let bobs = AlertFilter { user_id: Some(bob), ..Default::default() };
        assert_eq!(Alert::list(&db, &bobs, SortKey::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn storage_errors_during_reference_checks_surface() {
        let db = memory_pool().await.unwrap();
        let alice = seed_user(&db, "alice").await;
        sqlx::query("DROP TABLE vehicle").execute(&db).await.unwrap();

        let mut f = fields("Wash");
        f.vehicle_id = Some(1);
        assert!(matches!(Alert::create(&db, &f, alice).await, Err(AppError::Storage(_))));
    }
}
