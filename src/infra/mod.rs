//! Concrete collaborator implementations.

pub mod names;
pub mod openweather;
