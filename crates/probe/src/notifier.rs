//! Delivery of rendered reports.

use crate::config::EmailSettings;
use async_trait::async_trait;
use common::{Error, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

/// Port on which SMTP servers expect implicit TLS.
const SMTPS_PORT: u16 = 465;

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsMode {
    /// TLS from the first byte (SMTPS)
    Implicit,
    /// STARTTLS when the server offers it, plain text otherwise
    Opportunistic,
}

impl TlsMode {
    fn for_port(port: u16) -> Self {
        if port == SMTPS_PORT {
            TlsMode::Implicit
        } else {
            TlsMode::Opportunistic
        }
    }
}

/// Sink for rendered reports
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one report with an HTML body
    async fn send(&self, subject: &str, html_body: &str) -> Result<()>;
}

/// Delivers reports as HTML mail through an authenticated SMTP relay
pub struct SmtpNotifier {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Create a notifier sending as `display_name <settings.user>`
    pub fn new(display_name: &str, settings: &EmailSettings) -> Result<Self> {
        let sender: Address = settings
            .user
            .parse()
            .map_err(|e| Error::config(format!("invalid sender address {}: {}", settings.user, e)))?;
        let to: Mailbox = settings
            .to
            .parse()
            .map_err(|e| Error::config(format!("invalid recipient address {}: {}", settings.to, e)))?;

        let invalid_host = |e: lettre::transport::smtp::Error| {
            Error::config(format!("invalid SMTP host {}: {}", settings.host, e))
        };
        let builder = match TlsMode::for_port(settings.port) {
            TlsMode::Implicit => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host).map_err(invalid_host)?
            }
            TlsMode::Opportunistic => {
                let parameters = TlsParameters::new(settings.host.clone()).map_err(invalid_host)?;
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                    .tls(Tls::Opportunistic(parameters))
            }
        };

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.authorization_code.clone(),
            ))
            .build();

        Ok(Self {
            from: Mailbox::new(Some(display_name.to_string()), sender),
            to,
            transport,
        })
    }

    fn message(&self, subject: &str, html_body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(Error::notification)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, html_body: &str) -> Result<()> {
        let message = self.message(subject, html_body)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(Error::notification)?;
        debug!(code = %response.code(), "SMTP relay accepted report");
        Ok(())
    }
}
