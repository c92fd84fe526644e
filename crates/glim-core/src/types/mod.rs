//! Core type definitions used across the Glim workspace.

pub mod pagination;

pub use pagination::PageRequest;
