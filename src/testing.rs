//! Seed helpers shared by repository tests.

use sqlx::SqlitePool;

use crate::db::Id;
use crate::jobs::{Job, JobFields};
use crate::users::{NewUser, User};
use crate::vehicles::{Vehicle, VehicleFields};

pub(crate) async fn seed_user(db: &SqlitePool, username: &str) -> Id {
    User::create(
        db,
        &NewUser {
            username: username.into(),
            email: None,
            description: None,
            password_hash: None,
            is_admin: false,
        },
    )
    .await
    .expect("seed user")
}

pub(crate) async fn seed_vehicle(db: &SqlitePool, owner: Id, name: &str) -> Id {
    let fields = VehicleFields {
        name: name.into(),
        ..Default::default()
    };
    Vehicle::create(db, &fields, owner).await.expect("seed vehicle")
}

pub(crate) async fn seed_job(db: &SqlitePool, owner: Id, name: &str, vehicle_id: Option<Id>) -> Id {
    let fields = JobFields {
        name: name.into(),
        vehicle_id,
        ..Default::default()
    };
    Job::create(db, &fields, owner).await.expect("seed job")
}
