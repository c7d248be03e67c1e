//! HBnB data layer: rental-listing models that persist either to a JSON file
//! or to a SQL database, selected once per process by configuration.

pub mod config;
pub mod console;
pub mod db_storage;
pub mod error;
pub mod file_storage;
pub mod models;
pub mod schema;
pub mod storage;

pub use error::{AppError, AppResult};

#[cfg(test)]
mod tests;
