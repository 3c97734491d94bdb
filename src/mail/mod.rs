//! Transactional mail delivery.
//!
//! A [`Mailer`] is built once at startup from [`Config`], verified in the
//! background, and then shared by every caller that needs to send email.

pub mod message;
pub mod profile;
pub mod readiness;
pub mod smtp;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lettre::message::Mailbox;
use tokio::sync::watch;

pub use message::{OutgoingMessage, SendResult};
pub use profile::{select_profile, TransportProfile};
pub use readiness::Readiness;
pub use smtp::SmtpMailTransport;
pub use transport::{MailTransport, ProviderReceipt};

use crate::config::Config;
use crate::error::{MailError, Result, NOT_CONFIGURED_MESSAGE};

/// Target for the per-send observability events.
pub const EVENT_TARGET: &str = "blogify_mailer::events";

/// Shared handle to the configured mail transport.
#[derive(Clone)]
pub struct Mailer {
    inner: Arc<MailerInner>,
}

struct MailerInner {
    profile: TransportProfile,
    client: Option<Client>,
    readiness: watch::Receiver<Readiness>,
}

struct Client {
    transport: Arc<dyn MailTransport>,
    /// Parsed per send so a bad default never blocks startup.
    from: String,
}

impl Mailer {
    /// Select a profile from `config` and build the matching SMTP client.
    ///
    /// Starts the verification handshake in the background; call from inside
    /// a Tokio runtime.
    pub fn init(config: &Config) -> Result<Self> {
        let profile = select_profile(config);
        if !profile.is_configured() {
            tracing::warn!("No email provider configured. {}", NOT_CONFIGURED_MESSAGE);
            return Ok(Self::unconfigured());
        }

        let transport = SmtpMailTransport::from_profile(
            &profile,
            Duration::from_secs(config.timeout_seconds),
        )?;

        Self::with_transport(profile, &config.default_from(), transport)
    }

    /// Same as [`Mailer::init`] with an explicit transport.
    pub fn with_transport<T: MailTransport>(
        profile: TransportProfile,
        default_from: &str,
        transport: T,
    ) -> Result<Self> {
        if !profile.is_configured() {
            return Ok(Self::unconfigured());
        }

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(MailError::Transport(
                "mailer must be initialized inside a Tokio runtime".to_string(),
            ));
        }

        let transport: Arc<dyn MailTransport> = Arc::new(transport);
        let (tx, rx) = watch::channel(Readiness::Pending);
        spawn_verification(transport.clone(), profile.describe(), tx);

        if let Err(e) = default_from.parse::<Mailbox>() {
            tracing::warn!(
                provider = %profile,
                from = %default_from,
                error = %e,
                "Default sender is not a valid mailbox; set EMAIL_FROM or pass `from` per message"
            );
        }
        tracing::info!(provider = %profile, from = %default_from, "Mail transport initialized");

        Ok(Self {
            inner: Arc::new(MailerInner {
                profile,
                client: Some(Client {
                    transport,
                    from: default_from.to_string(),
                }),
                readiness: rx,
            }),
        })
    }

    /// A mailer with no provider. Every send fails with `NotConfigured`.
    pub fn unconfigured() -> Self {
        let (_tx, rx) = watch::channel(Readiness::Unconfigured);
        Self {
            inner: Arc::new(MailerInner {
                profile: TransportProfile::Unconfigured,
                client: None,
                readiness: rx,
            }),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.client.is_some()
    }

    pub fn profile(&self) -> &TransportProfile {
        &self.inner.profile
    }

    /// Current verification state.
    pub fn readiness(&self) -> watch::Receiver<Readiness> {
        self.inner.readiness.clone()
    }

    /// Wait until verification has reported, then return its outcome.
    pub async fn wait_ready(&self) -> Readiness {
        let mut rx = self.readiness();
        let settled = rx.wait_for(Readiness::is_settled).await.map(|state| state.clone());
        match settled {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Validate and deliver one message.
    ///
    /// Every failure is logged once here and returned unchanged; nothing is
    /// retried.
    pub async fn send_email(&self, message: OutgoingMessage) -> Result<SendResult> {
        let Some(client) = &self.inner.client else {
            let err = MailError::NotConfigured;
            self.log_failure(&message, &err);
            return Err(err);
        };

        let prepared = match message.prepare(&client.from) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.log_failure(&message, &err);
                return Err(err);
            }
        };

        match client.transport.send(prepared.message).await {
            Ok(receipt) => {
                let message_id = if receipt.message_id.is_empty() {
                    prepared.message_id
                } else {
                    receipt.message_id
                };
                tracing::info!(
                    target: EVENT_TARGET,
                    outcome = "sent",
                    to = %message.to,
                    message_id = %message_id,
                    provider = %self.inner.profile,
                    "Email queued/sent"
                );
                Ok(SendResult {
                    message_id,
                    accepted: prepared.accepted,
                    response_code: receipt.code,
                    response: receipt.response,
                    sent_at: Utc::now(),
                })
            }
            Err(provider_err) => {
                let err = MailError::Delivery(provider_err);
                self.log_failure(&message, &err);
                Err(err)
            }
        }
    }

    fn log_failure(&self, message: &OutgoingMessage, err: &MailError) {
        let (code, permanent) = match err {
            MailError::Delivery(provider) => (provider.code.as_deref(), Some(provider.permanent)),
            _ => (None, None),
        };
        tracing::error!(
            target: EVENT_TARGET,
            outcome = "failed",
            to = %message.to,
            subject = %message.subject,
            provider = %self.inner.profile,
            error = %err,
            code = ?code,
            permanent = ?permanent,
            "Error sending email"
        );
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("profile", &self.inner.profile)
            .field("readiness", &*self.inner.readiness.borrow())
            .finish()
    }
}

/// Run the verification handshake once, detached from the caller.
///
/// A panic inside `verify()` is reported as `Readiness::Failed`.
fn spawn_verification(
    transport: Arc<dyn MailTransport>,
    provider: String,
    tx: watch::Sender<Readiness>,
) {
    tokio::spawn(async move {
        let outcome = tokio::spawn(async move { transport.verify().await }).await;
        let state = match outcome {
            Ok(Ok(())) => {
                tracing::info!(
                    target: EVENT_TARGET,
                    outcome = "verified",
                    provider = %provider,
                    "Mail transport verified and ready to send emails"
                );
                Readiness::Ready
            }
            Ok(Err(e)) => {
                tracing::error!(
                    target: EVENT_TARGET,
                    outcome = "verification_failed",
                    provider = %provider,
                    error = %e,
                    code = ?e.code,
                    "Mail transport verification failed"
                );
                Readiness::Failed(e.to_string())
            }
            Err(join_err) => {
                tracing::error!(
                    target: EVENT_TARGET,
                    outcome = "verification_failed",
                    provider = %provider,
                    error = %join_err,
                    "Mail transport verification aborted"
                );
                Readiness::Failed(format!("verification aborted: {}", join_err))
            }
        };
        tx.send_replace(state);
    });
}
