use crate::config::Config;
use anyhow::Context;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use tracing::warn;

/// External mail collaborator. When SMTP is not configured the mailer stays
/// enabled but logs the reset link instead of dispatching it, so the flow
/// remains exercisable in development.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = match (
            &config.smtp_host,
            &config.smtp_username,
            &config.smtp_password,
        ) {
            (Some(host), Some(username), Some(password)) => {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .context("invalid SMTP relay host")?
                    .credentials(Credentials::new(username.clone(), password.clone()))
                    .build();
                Some(transport)
            }
            _ => {
                warn!("SMTP not configured; password reset links will be logged, not emailed");
                None
            }
        };

        Ok(Self {
            transport,
            from: config.mail_from.clone(),
        })
    }

    pub async fn send_password_reset(
        &self,
        to: &str,
        link: &str,
        ttl_minutes: i64,
    ) -> anyhow::Result<()> {
        let Some(transport) = &self.transport else {
            warn!(%to, %link, "mailer disabled; reset link not sent");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.parse().context("invalid MAIL_FROM address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject("Password reset request")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Use the link below to reset your password. \
                 It expires in {ttl_minutes} minutes.\n\n{link}\n\n\
                 If you did not request this, you can safely ignore this email."
            ))
            .context("failed to build reset email")?;

        transport.send(message).await.context("SMTP send failed")?;

        Ok(())
    }
}

#[cfg(test)]
impl Mailer {
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: "FLMS <no-reply@flms.local>".to_string(),
        }
    }
}
