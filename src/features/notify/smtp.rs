//! SMTP transport for review reminders.

use super::{MailTransport, NotificationError, ReviewEmail};
use crate::features::review::SmtpSettings;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::info;

/// Port that speaks TLS from the first byte (SMTPS)
const IMPLICIT_TLS_PORT: u16 = 465;

/// Delivers reminders through an SMTP relay.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotificationError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.server)
            .port(settings.port)
            .tls(tls_mode(settings)?);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = sender_mailbox(settings)?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Implicit TLS on 465, mandatory STARTTLS on other ports, plaintext when TLS is off
fn tls_mode(settings: &SmtpSettings) -> Result<Tls, NotificationError> {
    if !settings.tls {
        return Ok(Tls::None);
    }

    let params = TlsParameters::new(settings.server.clone())
        .map_err(|e| NotificationError::InvalidConfig(format!("TLS configuration error: {e}")))?;
    Ok(if settings.port == IMPLICIT_TLS_PORT {
        Tls::Wrapper(params)
    } else {
        Tls::Required(params)
    })
}

fn sender_mailbox(settings: &SmtpSettings) -> Result<Mailbox, NotificationError> {
    let address = settings
        .sender_email
        .parse()
        .map_err(|e: lettre::address::AddressError| NotificationError::InvalidAddress {
            address: settings.sender_email.clone(),
            reason: e.to_string(),
        })?;
    Ok(Mailbox::new(settings.sender_name.clone(), address))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: &ReviewEmail) -> Result<(), NotificationError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| NotificationError::InvalidAddress {
                address: email.to.clone(),
                reason: e.to_string(),
            })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        info!("Email sent successfully to {}", email.to);
        Ok(())
    }
}
