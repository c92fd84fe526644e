//! JWT claims carried by access and refresh tokens.

use serde::{Deserialize, Serialize};

use glim_core::error::AppError;
use glim_core::result::AppResult;

/// Issuer and audience of every token.
pub const ISSUER: &str = "api.glim.server";
/// Subject of every token.
pub const SUBJECT: &str = "api.glim.client";

/// Claims of a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    /// Catalog uid of the token owner.
    pub uid: i64,
    /// Issued-at of the login that started the refresh chain.
    pub iat: i64,
    pub exp: i64,
    /// Token identifier tracked in the session store.
    pub jti: String,
    pub manager: bool,
    pub readonly: bool,
}

/// Claims of a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub uid: i64,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    /// Identifier of the access token minted alongside this one.
    pub ajti: String,
}

impl RefreshClaims {
    /// Seconds until the token expires, zero once expired.
    pub fn remaining_seconds(&self, now: i64) -> u64 {
        u64::try_from(self.exp - now).unwrap_or(0)
    }
}

/// Verified claims before the required fields are checked.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    uid: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    jti: Option<String>,
    #[serde(default)]
    ajti: Option<String>,
    #[serde(default)]
    manager: Option<bool>,
    #[serde(default)]
    readonly: Option<bool>,
}

fn required<T>(value: Option<T>, name: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::malformed_token(format!("token is missing the {name} claim")))
}

impl RawClaims {
    pub(crate) fn into_access(self) -> AppResult<AccessClaims> {
        Ok(AccessClaims {
            iss: self.iss.unwrap_or_default(),
            aud: self.aud.unwrap_or_default(),
            sub: self.sub.unwrap_or_default(),
            uid: required(self.uid, "uid")?,
            iat: required(self.iat, "iat")?,
            exp: required(self.exp, "exp")?,
            jti: required(self.jti, "jti")?,
            manager: required(self.manager, "manager")?,
            readonly: required(self.readonly, "readonly")?,
        })
    }

    pub(crate) fn into_refresh(self) -> AppResult<RefreshClaims> {
        Ok(RefreshClaims {
            iss: self.iss.unwrap_or_default(),
            aud: self.aud.unwrap_or_default(),
            sub: self.sub.unwrap_or_default(),
            uid: required(self.uid, "uid")?,
            iat: required(self.iat, "iat")?,
            exp: required(self.exp, "exp")?,
            jti: required(self.jti, "jti")?,
            ajti: required(self.ajti, "ajti")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glim_core::error::ErrorKind;

    #[test]
    fn test_missing_role_claims_are_malformed() {
        let raw: RawClaims =
            serde_json::from_str(r#"{"uid":3,"iat":1,"exp":2,"jti":"a"}"#).unwrap();
        let err = raw.into_access().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedToken);
        assert!(err.message.contains("manager"));
    }

    #[test]
    fn test_refresh_requires_ajti() {
        let raw: RawClaims =
            serde_json::from_str(r#"{"uid":3,"iat":1,"exp":2,"jti":"a"}"#).unwrap();
        assert_eq!(
            raw.into_refresh().unwrap_err().kind,
            ErrorKind::MalformedToken
        );
    }

    #[test]
    fn test_remaining_seconds() {
        let claims = RefreshClaims {
            iss: ISSUER.into(),
            aud: ISSUER.into(),
            sub: SUBJECT.into(),
            uid: 1,
            iat: 0,
            exp: 100,
            jti: "r".into(),
            ajti: "a".into(),
        };
        assert_eq!(claims.remaining_seconds(40), 60);
        assert_eq!(claims.remaining_seconds(400), 0);
    }
}
