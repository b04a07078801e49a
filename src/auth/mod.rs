use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::ApiError;

/// Signed claim set carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

impl Claims {
    fn new(user_id: i64, email: String, username: String, expiration_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email,
            username,
            exp: (now + Duration::hours(expiration_hours)).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Issues and verifies HMAC-signed identity tokens.
///
/// Pure function of the configured secret and the wall clock: nothing is
/// stored server-side and there is no revocation list, so a token stays
/// valid until its natural expiry.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_hours: i64,
}

impl TokenService {
    /// Construct from config. An empty secret refuses construction so a
    /// misconfigured deployment fails at startup rather than per request.
    pub fn new(config: &JwtConfig) -> Result<Self, ApiError> {
        if config.secret.trim().is_empty() {
            return Err(ApiError::Configuration("JWT secret is not set".into()));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expiration_hours: config.expiration_hours,
        })
    }

    pub fn issue(&self, user_id: i64, email: &str, username: &str) -> Result<String, ApiError> {
        let claims = Claims::new(user_id, email.to_string(), username.to_string(), self.expiration_hours);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(ApiError::internal)
    }

    /// Decode and verify a token. The accepted algorithm is pinned to HS256;
    /// a token signed with anything else is rejected outright, closing the
    /// classic algorithm-substitution hole. Expiry and not-before are checked
    /// against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}
