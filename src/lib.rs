pub mod aggregation;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod registry;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

pub use sea_orm;
