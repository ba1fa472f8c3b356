pub mod condition;
pub mod daily;
pub mod period;
pub mod station;
