pub mod error;
pub mod filter;
pub mod station_list;
