use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::Id;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub is_metric: bool,
    pub vin: Option<String>,
    pub year: Option<i64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub odometer: Option<i64>,
    pub user_id: Id,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Descriptive fields shared by create and edit bodies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFields {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_metric: bool,
    pub vin: Option<String>,
    pub year: Option<i64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub odometer: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    #[serde(flatten)]
    pub fields: VehicleFields,
    /// Defaults to the caller.
    pub user_id: Option<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditVehicle {
    pub id: Id,
    #[serde(flatten)]
    pub fields: VehicleFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilter {
    #[serde(rename = "user")]
    pub user_id: Option<Id>,
    #[serde(rename = "job")]
    pub job_id: Option<Id>,
    #[serde(rename = "q")]
    pub search: Option<String>,
}
