//! Application-level cascade deletes.
//!
//! The schema has no foreign-key cascades, so removing a vehicle, job or
//! label walks its dependents here first:
//!
//! - vehicle: its jobs (each cascaded) and alerts pointing at the vehicle
//! - job: its tasks, alerts and label assignments
//! - label: its job assignments only, never the jobs
//!
//! Cleanup of dependents is best effort. Each failure is logged and counted,
//! then the walk moves on. Only failures on the root itself reach the caller.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::alerts::{Alert, AlertFilter};
use crate::db::Id;
use crate::error::{AppError, AppResult};
use crate::jobs::{Job, JobFilter};
use crate::labels::{JobLabel, Label, LabelFilter};
use crate::query::SortKey;
use crate::tasks::{Task, TaskFilter};
use crate::vehicles::Vehicle;

/// Dependent rows handled during one cascade.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub removed: usize,
    pub failed: usize,
}

impl CascadeReport {
    fn record(&mut self, outcome: AppResult<u64>, what: &str, id: Id) {
        match outcome {
            Ok(_) => self.removed += 1,
            Err(e) => {
                warn!(error = %e, id, "could not remove {what}");
                self.failed += 1;
            }
        }
    }

    fn absorb(&mut self, other: CascadeReport) {
        self.removed += other.removed;
        self.failed += other.failed;
    }
}

/// Dependents listed for cleanup. A failed listing counts as one failure
/// and yields nothing to walk.
fn listed<T>(report: &mut CascadeReport, rows: AppResult<Vec<T>>, what: &str, parent: Id) -> Vec<T> {
    rows.unwrap_or_else(|e| {
        warn!(error = %e, parent, "could not list {what}");
        report.failed += 1;
        Vec::new()
    })
}

fn ensure_owned(owner: Option<Id>, actual: Option<Id>, what: &str) -> AppResult<()> {
    match owner {
        Some(owner) if actual != Some(owner) => Err(AppError::Unauthorized(format!(
            "{what} belongs to another user"
        ))),
        _ => Ok(()),
    }
}

/// Deletes a vehicle after cascading through its jobs and alerts.
///
/// The root is checked before any dependent is touched, so a caller that
/// does not own it gets [`AppError::Unauthorized`] with nothing removed.
pub async fn delete_vehicle(db: &SqlitePool, vehicle_id: Id, owner: Option<Id>) -> AppResult<CascadeReport> {
    let vehicle = Vehicle::get_by_id(db, vehicle_id).await?;
    ensure_owned(owner, Some(vehicle.user_id), "vehicle")?;

    let mut report = CascadeReport::default();
    let jobs = listed(
        &mut report,
        Job::list(db, &JobFilter { vehicle_id: Some(vehicle_id), ..Default::default() }, SortKey::default()).await,
        "jobs",
        vehicle_id,
    );
    for job in jobs {
        report.absorb(cascade_job(db, job.id).await);
        report.record(Job::delete(db, job.id, None).await, "job", job.id);
    }

    let alerts = listed(
        &mut report,
        Alert::list(db, &AlertFilter { vehicle_id: Some(vehicle_id), ..Default::default() }, SortKey::default()).await,
        "alerts",
        vehicle_id,
    );
    for alert in alerts {
        report.record(Alert::delete(db, alert.id, None).await, "alert", alert.id);
    }

    Vehicle::delete(db, vehicle_id, owner).await?;
    info!(vehicle_id, removed = report.removed, failed = report.failed, "vehicle cascade done");
    Ok(report)
}

/// Deletes a job after removing its tasks and alerts and unassigning its
/// labels. The labels themselves stay.
pub async fn delete_job(db: &SqlitePool, job_id: Id, owner: Option<Id>) -> AppResult<CascadeReport> {
    let job = Job::get_by_id(db, job_id).await?;
    ensure_owned(owner, Some(job.user_id), "job")?;

    let report = cascade_job(db, job_id).await;
    Job::delete(db, job_id, owner).await?;
    info!(job_id, removed = report.removed, failed = report.failed, "job cascade done");
    Ok(report)
}

/// Removes the dependents of one job, leaving the job row itself.
async fn cascade_job(db: &SqlitePool, job_id: Id) -> CascadeReport {
    let mut report = CascadeReport::default();

    let tasks = listed(
        &mut report,
        Task::list(db, &TaskFilter::for_job(job_id), SortKey::default()).await,
        "tasks",
        job_id,
    );
    for task in tasks {
        report.record(Task::delete(db, task.id, Some(job_id)).await, "task", task.id);
    }

    let alerts = listed(
        &mut report,
        Alert::list(db, &AlertFilter { job_id: Some(job_id), ..Default::default() }, SortKey::default()).await,
        "alerts",
        job_id,
    );
    for alert in alerts {
        report.record(Alert::delete(db, alert.id, None).await, "alert", alert.id);
    }

    let labels = listed(
        &mut report,
        Label::list(db, &LabelFilter { job_id: Some(job_id), ..Default::default() }, SortKey::default()).await,
        "labels",
        job_id,
    );
    for label in labels {
        report.record(JobLabel::unassign(db, job_id, label.id).await, "label assignment", label.id);
    }

    report
}

/// Deletes a label after unassigning it from every job.
pub async fn delete_label(db: &SqlitePool, label_id: Id, owner: Option<Id>) -> AppResult<CascadeReport> {
    let label = Label::get_by_id(db, label_id).await?;
    ensure_owned(owner, label.user_id, "label")?;

    let mut report = CascadeReport::default();
    let jobs = listed(
        &mut report,
        Job::list(db, &JobFilter { label_id: Some(label_id), ..Default::default() }, SortKey::default()).await,
        "jobs",
        label_id,
    );
    for job in jobs {
        report.record(JobLabel::unassign(db, job.id, label_id).await, "label assignment", job.id);
    }

    Label::delete(db, label_id, owner).await?;
    info!(label_id, removed = report.removed, failed = report.failed, "label cascade done");
    Ok(report)
}
