pub mod data_loader;
pub mod data_source;
pub mod error;
pub mod extractor;
