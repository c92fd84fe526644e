//! User entity.

pub mod model;

pub use model::{ADMIN_USERNAME, NewUser, SEARCH_USERNAME, User, UserChanges};
