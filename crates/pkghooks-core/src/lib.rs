//! # pkghooks-core
//!
//! Core crate for pkghooks. Contains the configuration schema, the package
//! model handed to lifecycle hooks, and the unified error system.
//!
//! This crate has **no** internal dependencies on other pkghooks crates.

pub mod config;
pub mod error;
pub mod package;
pub mod result;

pub use error::AppError;
pub use package::Package;
pub use result::AppResult;
