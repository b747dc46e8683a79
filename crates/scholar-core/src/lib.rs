//! Scholar core — shared chat types, configuration, and small utilities.

pub mod config;
pub mod types;
pub mod utils;
