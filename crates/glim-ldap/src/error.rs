//! Connection-level failures of the LDAP front-end.

use thiserror::Error;

use crate::ber::BerError;
use crate::protocol::DecodeError;

#[derive(Debug, Error)]
pub enum LdapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request: {0}")]
    Decode(#[from] DecodeError),

    #[error("request of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),
}

impl From<BerError> for LdapError {
    fn from(err: BerError) -> Self {
        Self::Decode(err.into())
    }
}
