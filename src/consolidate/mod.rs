pub mod consolidator;
pub mod error;
