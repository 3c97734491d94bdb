use async_trait::async_trait;
use lettre::Message;

use crate::error::ProviderError;

/// What the provider reports back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReceipt {
    pub message_id: String,
    pub code: Option<String>,
    pub response: Vec<String>,
}

/// A send-capable connection to a mail provider.
///
/// Implementations must be safe to share between concurrent sends.
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    /// Hand one message to the provider.
    async fn send(&self, message: Message) -> Result<ProviderReceipt, ProviderError>;

    /// Connectivity and credential check, run once after startup.
    async fn verify(&self) -> Result<(), ProviderError>;
}
