//! # glim-ldap
//!
//! LDAPv3 front-end for Glim. Serves a read-only view of the catalog:
//!
//! - Simple bind with `uid=<user>,ou=Users,<domain>` (or `cn=admin,<domain>`)
//! - Search over `ou=Users` (inetOrgPerson) and `ou=Groups` (groupOfNames)
//! - The "Who am I?" extended operation
//!
//! The BER codec and message model are implemented here; nothing else of
//! the protocol is supported.

pub mod ber;
pub mod dn;
pub mod entry;
pub mod error;
pub mod handler;
pub mod ops;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tree;

pub use error::LdapError;
pub use handler::LdapHandler;
pub use server::{serve, serve_listener};
