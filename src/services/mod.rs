//! Collaborator interfaces the pipeline depends on.
//!
//! [`NameLookup`] answers first-name questions for identity inference.
//! [`WeatherSource`] fetches hourly observations for a place.

pub mod name_lookup;
pub mod weather_api;

pub use name_lookup::{NameLookup, NameStats};
pub use weather_api::{Place, WeatherSource};
