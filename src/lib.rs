//! Elvis catalogue read service: tiered, cache-backed representations of
//! pieces, movements, composers and collections.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
