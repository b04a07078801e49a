use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::error::ApiError;

/// Outbound mail seam. Production uses SMTP; tests and credential-less dev
/// environments get the logging mock.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ApiError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, ApiError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(ApiError::internal)?
            .port(config.port)
            .credentials(Credentials::new(config.from.clone(), config.password.clone()))
            .build();
        Ok(Self { transport, from: config.from.clone() })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ApiError> {
        let message = Message::builder()
            .from(self.from.parse().map_err(ApiError::internal)?)
            .to(to.parse().map_err(|_| {
                ApiError::validation_detail("Invalid request body", "email address is not deliverable")
            })?)
            .subject("Your verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your verification code is {code}. It expires in 10 minutes.\n\
                 If you did not request this, ignore this message.\n"
            ))
            .map_err(ApiError::internal)?;

        self.transport.send(message).await.map_err(ApiError::internal)?;
        Ok(())
    }
}

/// Logs instead of sending. Selected when no SMTP credentials are configured.
pub struct MockMailer;

#[async_trait]
impl Mailer for MockMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ApiError> {
        tracing::info!(%to, %code, "mock mailer: verification code not actually sent");
        Ok(())
    }
}
