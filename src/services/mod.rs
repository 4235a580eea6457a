pub mod processing;
pub mod report_service;
