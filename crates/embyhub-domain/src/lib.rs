//! Domain types shared across embyhub crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never depend on `infra/` from here.

pub mod id;
pub mod invite;
