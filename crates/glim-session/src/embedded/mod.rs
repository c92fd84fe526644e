//! Persistent embedded session store.

pub mod store;

pub use store::EmbeddedSessionStore;
