//! # glim-core
//!
//! Core crate for Glim. Contains the configuration schema, the session
//! store trait, pagination types, TLS material loading and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Glim crates.

pub mod config;
pub mod error;
pub mod result;
pub mod tls;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
