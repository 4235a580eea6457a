pub mod upload;
pub mod views;
