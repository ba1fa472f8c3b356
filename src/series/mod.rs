pub mod error;
pub mod interpolate;
pub mod normalize;
