pub mod alerts;
pub mod app;
pub mod auth;
pub mod cascade;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod labels;
pub mod query;
pub mod state;
pub mod tasks;
pub mod users;
pub mod vehicles;

#[cfg(test)]
pub(crate) mod testing;
