use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::error::ApiError;

/// TTL store for single-use email verification codes.
///
/// Codes live under `verification:{email}` for ten minutes; Redis expiry does
/// the cleanup, consumption deletes eagerly.
#[derive(Clone)]
pub struct VerificationStore {
    client: redis::Client,
}

const CODE_TTL_SECS: u64 = 600;

impl VerificationStore {
    /// Parses the connection URL; no connection is made until first use, so a
    /// Redis outage surfaces per-request instead of blocking startup.
    pub fn new(config: &RedisConfig) -> Result<Self, ApiError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| ApiError::Configuration(format!("invalid Redis URL: {e}")))?;
        Ok(Self { client })
    }

    fn key(email: &str) -> String {
        format!("verification:{email}")
    }

    pub async fn store_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(Self::key(email), code, CODE_TTL_SECS).await?;
        Ok(())
    }

    pub async fn fetch_code(&self, email: &str) -> Result<Option<String>, ApiError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let code: Option<String> = conn.get(Self::key(email)).await?;
        Ok(code)
    }

    /// Single-use: called once a code has been accepted.
    pub async fn delete_code(&self, email: &str) -> Result<(), ApiError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(Self::key(email)).await?;
        Ok(())
    }
}
