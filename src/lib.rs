pub mod error;
pub mod validation;
pub mod model;
pub mod db;
pub mod auth;
pub mod recurrence;
pub mod ops;
pub mod queries;
pub mod config;
