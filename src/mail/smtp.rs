use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::profile::TransportProfile;
use super::transport::{MailTransport, ProviderReceipt};
use crate::error::{MailError, ProviderError, Result};

/// SMTP transport backed by lettre's pooled async client.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Build the client for a resolved profile.
    ///
    /// `secure` profiles use implicit TLS; the others connect in plaintext and
    /// upgrade with STARTTLS when the server offers it.
    pub fn from_profile(profile: &TransportProfile, timeout: Duration) -> Result<Self> {
        let (host, port) = match (profile.host(), profile.port()) {
            (Some(host), Some(port)) => (host, port),
            _ => return Err(MailError::NotConfigured),
        };

        let builder = if profile.secure() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Transport(format!("SMTP relay error: {}", e)))?
        } else {
            let tls_params = TlsParameters::new(host.to_string())
                .map_err(|e| MailError::Transport(format!("SMTP TLS params error: {}", e)))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Opportunistic(tls_params))
        };

        let mut builder = builder.port(port).timeout(Some(timeout));
        if let Some((user, pass)) = profile.credentials() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> std::result::Result<ProviderReceipt, ProviderError> {
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .unwrap_or_default()
            .to_string();

        let response = self.transport.send(message).await?;

        Ok(ProviderReceipt {
            message_id,
            code: Some(response.code().to_string()),
            response: response.message().map(str::to_string).collect(),
        })
    }

    async fn verify(&self) -> std::result::Result<(), ProviderError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(ProviderError::new("SMTP server refused the connection"))
        }
    }
}
