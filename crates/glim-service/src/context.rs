//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use glim_auth::AccessClaims;

/// Context for the current authenticated request.
///
/// Built by the auth middleware from the verified access token and passed
/// into service methods so that every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The caller's uid.
    pub uid: i64,
    /// Manager role claim.
    pub manager: bool,
    /// Read-only role claim.
    pub readonly: bool,
    /// Identifier of the access token in use.
    pub jti: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context from verified access claims.
    pub fn from_claims(claims: &AccessClaims) -> Self {
        Self {
            uid: claims.uid,
            manager: claims.manager,
            readonly: claims.readonly,
            jti: claims.jti.clone(),
            request_time: Utc::now(),
        }
    }

    /// Whether the caller may read any record.
    pub fn is_reader(&self) -> bool {
        self.manager || self.readonly
    }

    /// Whether the caller is acting on their own record.
    pub fn is_self(&self, uid: i64) -> bool {
        self.uid == uid
    }
}
