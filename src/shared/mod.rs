//! Shared components - input types, errors, configuration, and utilities

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;
