//! JWT token issuance and validation
//! Single access token per login, HS256, no refresh or revocation

use crate::{auth::Role, config::SecurityConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every token
pub const TOKEN_ISSUER: &str = "hospital-portal";

/// The only accepted signing algorithm
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub user_id: i64,

    /// Email at issuance time
    pub email: String,

    /// Role at issuance time
    pub role: Role,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

/// Token returned to the client after login
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64, // seconds until the token expires
}

/// JWT service
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenService {
    /// Create token service from security config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let secret = config.jwt_secret.expose_secret();

        if secret.trim().is_empty() {
            return Err(AppError::Config("JWT secret is not configured".to_string()));
        }

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < crate::config::MIN_JWT_SECRET_LEN {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        // Expiry is checked by `validate` against the caller's clock
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: config.token_ttl_secs,
        })
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a signed token for the given identity
    pub fn issue(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expiration = now + Duration::seconds(self.ttl_secs as i64);

        let claims = Claims {
            user_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };

        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: self.ttl_secs,
        })
    }

    /// Validate signature, algorithm, issuer and expiry; return the claims
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::InvalidToken(format!("{:?}", e.kind()))
            })?
            .claims;

        if claims.exp <= now.timestamp() {
            tracing::debug!(user_id = claims.user_id, exp = claims.exp, "Token expired");
            return Err(AppError::InvalidToken("ExpiredSignature".to_string()));
        }

        Ok(claims)
    }
}
