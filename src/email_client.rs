use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};

use crate::configuration::{EmailSettings, SmtpSecurity};
use crate::digest::DigestDocument;
use crate::domain::SubscriberEmail;

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Delivers one digest to one recipient. Failures are logged and
    /// reported as `false`, never raised.
    async fn send(&self, recipient: &SubscriberEmail, document: &DigestDocument) -> bool;
}

/// Sends through an authenticated SMTP relay, one session per message.
#[derive(Debug)]
pub struct EmailClient {
    smtp_host: String,
    smtp_port: u16,
    security: SmtpSecurity,
    sender: Mailbox,
    username: String,
    password: Secret<String>,
    timeout: Duration,
}

impl EmailClient {
    pub fn new(config: &EmailSettings) -> anyhow::Result<Self> {
        let sender = Mailbox::new(
            Some(config.sender_name.clone()),
            config
                .sender
                .as_ref()
                .parse()
                .with_context(|| format!("Invalid sender address {}", config.sender))?,
        );
        Ok(Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            security: config.security,
            sender,
            username: config.sender.as_ref().to_string(),
            password: config.password.clone(),
            timeout: config.timeout(),
        })
    }

    fn build_message(
        &self,
        recipient: &SubscriberEmail,
        document: &DigestDocument,
    ) -> anyhow::Result<Message> {
        let to: Mailbox = recipient
            .as_ref()
            .parse()
            .with_context(|| format!("Invalid recipient address {recipient}"))?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(&document.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(document.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(document.html_body.clone()),
                    ),
            )
            .context("Failed to build email message")
    }

    fn transport(&self) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = match self.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_host),
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            }
        }
        .context("Failed to create SMTP transport")?;

        let credentials = Credentials::new(
            self.username.clone(),
            self.password.expose_secret().clone(),
        );
        Ok(builder
            .port(self.smtp_port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build())
    }

    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        document: &DigestDocument,
    ) -> anyhow::Result<()> {
        let message = self.build_message(recipient, document)?;
        self.transport()?
            .send(message)
            .await
            .with_context(|| format!("Failed to send the digest to {recipient}"))?;
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for EmailClient {
    #[tracing::instrument(name = "Send digest email", skip(self, document), fields(subscriber_email = %recipient))]
    async fn send(&self, recipient: &SubscriberEmail, document: &DigestDocument) -> bool {
        match self.send_email(recipient, document).await {
            Ok(()) => {
                tracing::info!("Digest delivered");
                true
            }
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, "Failed to deliver the digest");
                false
            }
        }
    }
}
