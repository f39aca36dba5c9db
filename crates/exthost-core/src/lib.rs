//! # exthost-core
//!
//! Core crate for Exthost. Contains the unified error system, the closed
//! set of plugin kinds, and the host configuration schemas.
//!
//! This crate has **no** internal dependencies on other Exthost crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use types::PluginKind;
