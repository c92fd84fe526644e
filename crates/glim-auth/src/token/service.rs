//! Access/refresh token issuance, rotation and revocation.
//!
//! Every issued identifier is recorded in the session store as tracked;
//! revocation overwrites it with the denylist marker for at least the
//! remaining lifetime of the token it protects.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use glim_core::config::api::ApiConfig;
use glim_core::error::{AppError, ErrorKind};
use glim_core::result::AppResult;
use glim_core::traits::session_store::{REVOKED, SessionStore, TRACKED};
use glim_database::UserRepository;
use glim_entity::User;

use crate::jwt::{AccessClaims, ISSUER, JwtDecoder, JwtEncoder, RefreshClaims, SUBJECT};

const SECONDS_PER_DAY: i64 = 86_400;

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Access token expiry as unix seconds.
    pub expires_on: i64,
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, rotates and revokes token pairs.
#[derive(Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    store: Arc<dyn SessionStore>,
    users: UserRepository,
    access_ttl: u64,
    refresh_ttl: u64,
    max_days_relogin: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("max_days_relogin", &self.max_days_relogin)
            .finish()
    }
}

impl TokenService {
    /// Creates a token service from API configuration.
    pub fn new(config: &ApiConfig, store: Arc<dyn SessionStore>, users: UserRepository) -> Self {
        Self {
            encoder: JwtEncoder::new(&config.secret),
            decoder: JwtDecoder::new(&config.secret),
            store,
            users,
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
            max_days_relogin: config.max_days_relogin,
        }
    }

    /// Issues a fresh pair for a user whose credentials were just verified.
    pub async fn issue(&self, user: &User) -> AppResult<TokenPair> {
        let now = Utc::now().timestamp();
        let pair = self.mint(user, now, now).await?;
        info!(uid = user.uid, username = %user.username, "Issued token pair");
        Ok(pair)
    }

    /// Signs a new pair with the given chain start `iat` and records both
    /// identifiers as tracked.
    pub async fn mint(&self, user: &User, iat: i64, now: i64) -> AppResult<TokenPair> {
        let ajti = Uuid::new_v4().to_string();
        let rjti = Uuid::new_v4().to_string();
        let access_exp = now + ttl_secs(self.access_ttl);

        let access = AccessClaims {
            iss: ISSUER.to_string(),
            aud: ISSUER.to_string(),
            sub: SUBJECT.to_string(),
            uid: user.uid,
            iat,
            exp: access_exp,
            jti: ajti.clone(),
            manager: user.manager,
            readonly: user.readonly,
        };
        let refresh = RefreshClaims {
            iss: ISSUER.to_string(),
            aud: ISSUER.to_string(),
            sub: SUBJECT.to_string(),
            uid: user.uid,
            iat,
            exp: now + ttl_secs(self.refresh_ttl),
            jti: rjti.clone(),
            ajti: ajti.clone(),
        };

        let access_token = self.encoder.sign(&access)?;
        let refresh_token = self.encoder.sign(&refresh)?;

        self.store
            .set(&ajti, TRACKED, Duration::from_secs(self.access_ttl))
            .await?;
        self.store
            .set(&rjti, TRACKED, Duration::from_secs(self.refresh_ttl))
            .await?;

        Ok(TokenPair {
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl,
            expires_on: access_exp,
            access_token,
            refresh_token,
        })
    }

    /// Rotates a refresh token into a new pair, denylisting the old one.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.decoder.decode_refresh(refresh_token)?;
        let now = Utc::now().timestamp();

        let window = i64::try_from(self.max_days_relogin)
            .unwrap_or(i64::MAX / SECONDS_PER_DAY)
            .saturating_mul(SECONDS_PER_DAY);
        if claims.iat.saturating_add(window) < now {
            warn!(uid = claims.uid, jti = %claims.jti, "Refresh window exceeded");
            return Err(AppError::new(
                ErrorKind::RefreshWindowExceeded,
                "refresh token usage without log in exceeded",
            ));
        }

        let user = self
            .users
            .find_by_id(claims.uid)
            .await?
            .ok_or_else(|| AppError::new(ErrorKind::InvalidSubject, "invalid subject"))?;
        if user.locked {
            return Err(AppError::unauthorized("user account is locked"));
        }

        // Exactly one of two racing rotations of the same token wins.
        let ttl = self.revocation_ttl(&claims, now);
        if !self.store.revoke(&claims.jti, ttl).await? {
            warn!(uid = claims.uid, jti = %claims.jti, "Revoked refresh token presented");
            return Err(AppError::token_revoked("token has been revoked"));
        }
        self.store.set(&claims.ajti, REVOKED, ttl).await?;

        let pair = self.mint(&user, claims.iat, now).await?;
        info!(uid = user.uid, jti = %claims.jti, "Rotated token pair");
        Ok(pair)
    }

    /// Denylists both identifiers of a refresh token. Repeating the call
    /// succeeds.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let claims = self.decoder.decode_refresh(refresh_token)?;
        self.revoke_pair(&claims, Utc::now().timestamp()).await?;
        info!(uid = claims.uid, jti = %claims.jti, "Logged out");
        Ok(())
    }

    /// Verifies an access token and rejects denylisted identifiers.
    pub async fn validate(&self, access_token: &str) -> AppResult<AccessClaims> {
        let claims = self.decoder.decode_access(access_token)?;
        if self.store.is_revoked(&claims.jti).await? {
            return Err(AppError::token_revoked("token has been revoked"));
        }
        Ok(claims)
    }

    async fn revoke_pair(&self, claims: &RefreshClaims, now: i64) -> AppResult<()> {
        let ttl = self.revocation_ttl(claims, now);
        self.store.set(&claims.jti, REVOKED, ttl).await?;
        self.store.set(&claims.ajti, REVOKED, ttl).await?;
        Ok(())
    }

    /// Long enough to outlive both tokens of the pair.
    fn revocation_ttl(&self, claims: &RefreshClaims, now: i64) -> Duration {
        Duration::from_secs(claims.remaining_seconds(now).max(self.access_ttl).max(1))
    }
}

fn ttl_secs(ttl: u64) -> i64 {
    i64::try_from(ttl).unwrap_or(i64::MAX)
}
