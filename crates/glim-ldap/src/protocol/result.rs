//! LDAP result codes and the `LDAPResult` component.

use glim_core::error::{AppError, ErrorKind};

/// The subset of RFC 4511 result codes the server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    OperationsError,
    ProtocolError,
    TimeLimitExceeded,
    SizeLimitExceeded,
    AuthMethodNotSupported,
    NoSuchObject,
    InvalidDnSyntax,
    InvalidCredentials,
    InsufficientAccessRights,
    Unavailable,
    UnwillingToPerform,
    Other,
}

impl ResultCode {
    /// Numeric value sent on the wire.
    pub fn code(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::OperationsError => 1,
            Self::ProtocolError => 2,
            Self::TimeLimitExceeded => 3,
            Self::SizeLimitExceeded => 4,
            Self::AuthMethodNotSupported => 7,
            Self::NoSuchObject => 32,
            Self::InvalidDnSyntax => 34,
            Self::InvalidCredentials => 49,
            Self::InsufficientAccessRights => 50,
            Self::Unavailable => 52,
            Self::UnwillingToPerform => 53,
            Self::Other => 80,
        }
    }
}

/// Result code, matched DN and diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResult {
    pub code: ResultCode,
    pub matched_dn: String,
    pub message: String,
}

impl LdapResult {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            matched_dn: String::new(),
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(ResultCode::Success, "")
    }

    pub fn with_matched_dn(mut self, dn: impl Into<String>) -> Self {
        self.matched_dn = dn.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }
}

impl From<&AppError> for LdapResult {
    fn from(err: &AppError) -> Self {
        if err.kind.is_internal() {
            return Self::new(ResultCode::Other, "internal server error");
        }
        let code = match err.kind {
            ErrorKind::NotFound => ResultCode::NoSuchObject,
            ErrorKind::Unauthorized => ResultCode::InvalidCredentials,
            ErrorKind::Forbidden => ResultCode::InsufficientAccessRights,
            ErrorKind::ServiceUnavailable => ResultCode::Unavailable,
            ErrorKind::BadRequest | ErrorKind::Validation => ResultCode::UnwillingToPerform,
            _ => ResultCode::Other,
        };
        Self::new(code, err.message.clone())
    }
}
