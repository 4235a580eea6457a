pub mod common;
pub mod config;
pub mod reports;
pub mod routes;
pub mod services;
