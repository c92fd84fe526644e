//! # glim-auth
//!
//! Authentication for Glim.
//!
//! ## Modules
//!
//! - `jwt` - HS256 claims, encoding and verified decoding
//! - `password` - Argon2id password hashing and catalog credential checks
//! - `token` - token pair issuance, refresh rotation, logout and validation

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder, RefreshClaims};
pub use password::{CredentialVerifier, PasswordHasher, Verification};
pub use token::{TokenPair, TokenService};
