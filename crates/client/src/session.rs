//! The process-wide authenticated session.
//!
//! The client keeps exactly one active session: the bearer token plus
//! the identity decoded from it. Claims are read without verifying the
//! signature -- the store is authoritative and re-checks every request;
//! the client only needs the identity and the expiry instant.

use std::sync::{Arc, RwLock};

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use campusfix_core::error::CoreError;
use campusfix_core::model::Role;
use campusfix_core::types::{DbId, Timestamp};

/// Claims the store embeds in every access token.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject -- the username.
    pub sub: String,
    /// The user's internal database id.
    pub uid: DbId,
    /// The user's role.
    pub role: Role,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Decode a token's claims without verifying it.
///
/// A token that cannot be decoded fails closed: the caller gets an
/// error and no session or timer is ever built from it.
pub fn decode_claims(token: &str) -> Result<Claims, CoreError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    // The key is unused once signature validation is off, but the API
    // still wants one.
    let key = DecodingKey::from_secret(&[]);

    let data = jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map_err(|e| CoreError::Validation(format!("Malformed session token: {e}")))?;
    Ok(data.claims)
}

/// One authenticated session, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub user_id: DbId,
    pub role: Role,
    pub expires_at: Timestamp,
}

impl Session {
    /// Build a session by decoding the token's claims.
    pub fn from_token(token: impl Into<String>) -> Result<Self, CoreError> {
        let token = token.into();
        let claims = decode_claims(&token)?;
        let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| {
            CoreError::Validation(format!("Token expiry {} is out of range", claims.exp))
        })?;

        Ok(Self {
            username: claims.sub,
            user_id: claims.uid,
            role: claims.role,
            expires_at,
            token,
        })
    }
}

/// Shared handle to the process-wide session slot.
///
/// Set on login, cleared on logout or forced expiry. Cloning the handle
/// shares the slot.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active session.
    pub fn set(&self, session: Session) {
        let mut slot = self.inner.write().expect("session lock poisoned");
        *slot = Some(session);
    }

    /// Drop the active session (logout / forced re-authentication).
    pub fn clear(&self) {
        let mut slot = self.inner.write().expect("session lock poisoned");
        *slot = None;
    }

    /// A snapshot of the active session, if any.
    pub fn current(&self) -> Option<Session> {
        self.inner.read().expect("session lock poisoned").clone()
    }

    /// The active bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.token.clone())
    }
}
