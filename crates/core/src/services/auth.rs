//! Organizer authentication.
//!
//! Accounts live with an external credential service; this side only checks
//! the HS256 access tokens it issues and reads the subject.

use evote_common::config::AuthConfig;
use evote_common::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An authenticated event organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organizer {
    /// Subject of the access token.
    pub id: String,
}

impl Organizer {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Whether this organizer owns a record with the given owner id.
    #[must_use]
    pub fn owns(&self, owner_id: &str) -> bool {
        self.id == owner_id
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies organizer access tokens.
#[derive(Clone)]
pub struct AuthService {
    key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Authenticate a bearer token.
    pub fn authenticate(&self, token: &str) -> AppResult<Organizer> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected access token");
            AppError::Unauthorized
        })?;

        if data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized);
        }
        Ok(Organizer::new(data.claims.sub))
    }
}
