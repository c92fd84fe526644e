//! Verified token decoding.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use glim_core::error::AppError;
use glim_core::result::AppResult;

use super::claims::{AccessClaims, ISSUER, RawClaims, RefreshClaims};

/// Verifies signature, expiry, issuer and audience of incoming tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from the API secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[ISSUER]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decodes an access token.
    pub fn decode_access(&self, token: &str) -> AppResult<AccessClaims> {
        self.decode_raw(token)?.into_access()
    }

    /// Decodes a refresh token.
    pub fn decode_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        self.decode_raw(token)?.into_refresh()
    }

    fn decode_raw(&self, token: &str) -> AppResult<RawClaims> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::invalid_token("token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::invalid_token("invalid token signature")
                }
                _ => AppError::invalid_token(format!("invalid token: {e}")),
            },
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::SUBJECT;
    use crate::jwt::encoder::JwtEncoder;
    use glim_core::error::ErrorKind;

    fn access(exp: i64) -> AccessClaims {
        AccessClaims {
            iss: ISSUER.into(),
            aud: ISSUER.into(),
            sub: SUBJECT.into(),
            uid: 7,
            iat: chrono::Utc::now().timestamp(),
            exp,
            jti: "jti-1".into(),
            manager: false,
            readonly: true,
        }
    }

    #[test]
    fn test_signed_claims_verify() {
        let claims = access(chrono::Utc::now().timestamp() + 60);
        let token = JwtEncoder::new("secret").sign(&claims).unwrap();
        assert_eq!(JwtDecoder::new("secret").decode_access(&token).unwrap(), claims);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let claims = access(chrono::Utc::now().timestamp() + 60);
        let token = JwtEncoder::new("secret").sign(&claims).unwrap();
        let err = JwtDecoder::new("other").decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_expired_is_invalid() {
        let claims = access(chrono::Utc::now().timestamp() - 120);
        let token = JwtEncoder::new("secret").sign(&claims).unwrap();
        let err = JwtDecoder::new("secret").decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_foreign_audience_is_invalid() {
        let mut claims = access(chrono::Utc::now().timestamp() + 60);
        claims.aud = "someone.else".into();
        let token = JwtEncoder::new("secret").sign(&claims).unwrap();
        let err = JwtDecoder::new("secret").decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_garbage_is_invalid() {
        let err = JwtDecoder::new("secret").decode_refresh("not.a.jwt").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }
}
