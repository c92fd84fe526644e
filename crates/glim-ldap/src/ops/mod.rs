//! Implementations of the supported LDAP operations.

pub mod bind;
pub mod extended;
pub mod search;
