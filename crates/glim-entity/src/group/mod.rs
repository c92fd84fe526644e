//! Group entity.

pub mod model;

pub use model::{Group, GroupChanges, GroupRef, NewGroup};
