use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::TokenService;
use crate::email::Mailer;
use crate::error::ApiError;
use crate::kv::VerificationStore;
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        let username_len = self.username.chars().count();
        if !(3..=30).contains(&username_len) {
            return Err(ApiError::validation_detail(
                "Invalid request body",
                "username must be between 3 and 30 characters",
            ));
        }
        if self.password.chars().count() < 6 {
            return Err(ApiError::validation_detail(
                "Invalid request body",
                "password must be at least 6 characters",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ApiError::validation_detail("Invalid request body", "password is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SendVerificationCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

impl VerifyCodeRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        if self.code.chars().count() != 6 {
            return Err(ApiError::validation_detail(
                "Invalid request body",
                "code must be 6 digits",
            ));
        }
        Ok(())
    }
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    // Shape check only; deliverability is the verification flow's job
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !valid {
        return Err(ApiError::validation_detail(
            "Invalid request body",
            "email address is not valid",
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    tokens: Arc<TokenService>,
    verification: VerificationStore,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        tokens: Arc<TokenService>,
        verification: VerificationStore,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self { pool, tokens, verification, mailer }
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        if self.email_registered(&req.email).await? {
            return Err(ApiError::conflict(
                "Email already exists",
                "A user with this email already exists",
            ));
        }
        let username_taken: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = $1 AND deleted_at IS NULL")
                .bind(&req.username)
                .fetch_optional(&self.pool)
                .await?;
        if username_taken.is_some() {
            return Err(ApiError::conflict(
                "Username already exists",
                "A user with this username already exists",
            ));
        }

        let password_hash = hash_password(req.password.clone()).await?;

        let user: User = sqlx::query_as(
            "INSERT INTO users (email, username, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, email, username, password_hash, created_at, updated_at",
        )
        .bind(&req.email)
        .bind(&req.username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        let token = self.tokens.issue(user.id, &user.email, &user.username)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        // Unknown email and wrong password produce the same response, so a
        // caller cannot probe which addresses are registered
        let user: User = sqlx::query_as(
            "SELECT id, email, username, password_hash, created_at, updated_at \
             FROM users WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(&req.email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(req.password.clone(), user.password_hash.clone()).await? {
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.email, &user.username)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn profile(&self, user_id: i64) -> Result<User, ApiError> {
        sqlx::query_as(
            "SELECT id, email, username, password_hash, created_at, updated_at \
             FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("User"))
    }

    pub async fn send_verification_code(&self, email: &str) -> Result<(), ApiError> {
        if self.email_registered(email).await? {
            return Err(ApiError::conflict(
                "Email already exists",
                "A user with this email already exists",
            ));
        }

        let code = generate_code();
        self.verification.store_code(email, &code).await?;
        self.mailer.send_verification_code(email, &code).await?;
        Ok(())
    }

    pub async fn verify_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        let stored = self.verification.fetch_code(email).await?.ok_or_else(|| {
            ApiError::validation_detail(
                "Verification code is invalid",
                "The code was not found or has expired",
            )
        })?;

        if stored != code {
            return Err(ApiError::validation_detail(
                "Verification code is invalid",
                "The code does not match",
            ));
        }

        self.verification.delete_code(email).await?;
        Ok(())
    }

    async fn email_registered(&self, email: &str) -> Result<bool, ApiError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND deleted_at IS NULL")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6).map(|_| rng.gen_range(0..=9u8).to_string()).collect()
}

// bcrypt is deliberately slow; keep it off the async executor threads.
async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn email_shape_validation() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@.com").is_err());
    }

    #[test]
    fn register_request_validation() {
        let ok = RegisterRequest {
            email: "a@b.co".into(),
            username: "abc".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let short_name = RegisterRequest {
            email: "a@b.co".into(),
            username: "ab".into(),
            password: "secret".into(),
        };
        assert!(short_name.validate().is_err());

        let short_password = RegisterRequest {
            email: "a@b.co".into(),
            username: "abc".into(),
            password: "12345".into(),
        };
        assert!(short_password.validate().is_err());
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("hunter2!".into()).await.unwrap();
        assert!(verify_password("hunter2!".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3!".into(), hash).await.unwrap());
    }
}
