//! # glim-entity
//!
//! Domain entity models for Glim. Every struct in this crate represents a
//! catalog record or the data needed to create or change one.

pub mod group;
pub mod user;

pub use group::{Group, GroupChanges, GroupRef, NewGroup};
pub use user::{ADMIN_USERNAME, NewUser, SEARCH_USERNAME, User, UserChanges};
