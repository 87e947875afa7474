use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::MailConfig;

/// Password reset message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetMail {
    pub to: String,
    pub link: String,
}

impl ResetMail {
    pub const SUBJECT: &'static str = "Catchup Password Reset";

    pub fn body(&self) -> String {
        format!(
            "You are receiving this because a password reset was requested for your account.\n\n\
             Open the following link, or paste it into your browser, to choose a new password:\n\n\
             {}\n\n\
             If you did not ask for this, ignore this email and your password will stay the same.\n",
            self.link
        )
    }

    /// The link with its token cut off, for logs.
    pub fn redacted_link(&self) -> String {
        match self.link.rsplit_once('/') {
            Some((base, _token)) => format!("{base}/<withheld>"),
            None => "<withheld>".to_string(),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &ResetMail) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        user: Option<&str>,
        password: Option<&str>,
        from: &str,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("smtp relay {host}"))?;
        if let (Some(user), Some(password)) = (user, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), password.to_string()));
        }
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address {from}"))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &ResetMail) -> anyhow::Result<()> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address {}", mail.to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(ResetMail::SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body())
            .context("build reset mail")?;
        self.transport
            .send(message)
            .await
            .context("smtp send")?;
        debug!(to = %mail.to, "reset mail handed to smtp relay");
        Ok(())
    }
}

/// Used when no SMTP host is configured: logs the message instead of sending it.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &ResetMail) -> anyhow::Result<()> {
        info!(
            to = %mail.to,
            link = %mail.redacted_link(),
            "reset mail not sent, no smtp host configured; link withheld"
        );
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match cfg.host.as_deref() {
        Some(host) => {
            let mailer = SmtpMailer::new(
                host,
                cfg.user.as_deref(),
                cfg.password.as_deref(),
                &cfg.from,
            )?;
            Ok(Arc::new(mailer))
        }
        None => Ok(Arc::new(LogMailer)),
    }
}
