use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, warn};

use crate::config::{SmtpConfig, SmtpSecurity};

/// Delivery channel for verification codes.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send(&self, email: &str, code: &str) -> anyhow::Result<()>;
}

/// Writes the code to the log instead of mailing it. Local development only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send(&self, email: &str, code: &str) -> anyhow::Result<()> {
        info!(%email, %code, "verification code (smtp disabled)");
        Ok(())
    }
}

/// Mails codes through an SMTP relay, over STARTTLS or TLS unless told otherwise.
#[derive(Clone)]
pub struct SmtpCodeSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpCodeSender {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = cfg.from.parse().context("parse SMTP_FROM")?;
        let builder = match cfg.security {
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
                .context("configure STARTTLS relay")?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
                .context("configure TLS relay")?,
            SmtpSecurity::Insecure => {
                warn!(host = %cfg.host, "SMTP_INSECURE set; codes travel unencrypted");
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
            }
        };
        let mut builder = builder.port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        info!(host = %cfg.host, port = cfg.port, security = ?cfg.security, "smtp code delivery enabled");
        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl CodeSender for SmtpCodeSender {
    async fn send(&self, email: &str, code: &str) -> anyhow::Result<()> {
        let to: Mailbox = email.parse().context("parse recipient")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Your verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your verification code is {code}.\n\nIf you did not sign up, ignore this email."
            ))
            .context("build verification email")?;

        match self.mailer.send(message).await {
            Ok(_) => {
                info!(to = %email, "verification code sent");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, to = %email, "failed to send verification code");
                Err(anyhow::Error::new(e).context("smtp send"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        LogCodeSender.send("a@x.com", "123456").await.expect("log send");
    }

    fn smtp(security: SmtpSecurity, from: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: security.default_port(),
            security,
            username: Some("mailer".into()),
            password: Some("secret".into()),
            from: from.into(),
        }
    }

    #[test]
    fn smtp_sender_rejects_bad_from_address() {
        assert!(SmtpCodeSender::new(&smtp(SmtpSecurity::StartTls, "not an address")).is_err());
    }

    #[test]
    fn smtp_sender_builds_for_every_security_mode() {
        for security in [SmtpSecurity::StartTls, SmtpSecurity::Tls, SmtpSecurity::Insecure] {
            SmtpCodeSender::new(&smtp(security, "LiftLog <no-reply@example.com>"))
                .unwrap_or_else(|e| panic!("{security:?}: {e:#}"));
        }
    }
}
