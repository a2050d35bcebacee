pub mod config;
pub mod error;
pub mod features;
pub mod fetch;
pub mod identity;
pub mod infra;
pub mod join;
pub mod metrics;
pub mod model;
pub mod outliers;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod services;
pub mod weather;
