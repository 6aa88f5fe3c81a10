//! Internal implementation modules for `envwizard-core`.
//!
//! Most callers should go through `envwizard_core::api` rather than importing
//! these modules directly.

pub mod config;
pub mod project;
pub mod python;
pub mod tooling;
