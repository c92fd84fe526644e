//! # glim-session
//!
//! Session store implementations for Glim. Supports three modes:
//!
//! - **memory**: in-process store using [moka](https://crates.io/crates/moka)
//!   with a TTL per entry; lost on restart
//! - **embedded**: sqlite file under the configured store directory, so
//!   revocations survive a restart
//! - **redis**: remote store using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at startup based on configuration.

#[cfg(feature = "embedded")]
pub mod embedded;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::SessionStoreManager;
