pub mod config;
pub mod error;
pub mod file;
pub mod variant;
