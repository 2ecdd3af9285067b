//! Shared plumbing for embyhub binaries: configuration loading, tracing setup,
//! health probes, request-id middleware and small sea-orm/serde helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod tracing;
