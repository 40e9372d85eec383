//! # QueueCTL Config
//!
//! Configuration management for QueueCTL.
//! Supports layered configuration from files and environment variables,
//! validated before use.

mod app_config;
mod error;
mod loader;
mod validation;

pub use app_config::*;
pub use error::*;
pub use loader::*;
pub use validation::*;
