//! # glim-database
//!
//! Catalog store for Glim: connection management over sqlite or
//! PostgreSQL (through the sqlx `Any` driver), schema bootstrap, and the
//! user and group repositories.

pub mod connection;
pub mod migration;
pub mod repositories;
mod rows;

pub use connection::{Backend, DatabasePool};
pub use repositories::{GroupRepository, UserRepository};
