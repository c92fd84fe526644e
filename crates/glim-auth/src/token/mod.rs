//! Token pair lifecycle.

pub mod service;

pub use service::{TokenPair, TokenService};
