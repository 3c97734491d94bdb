use crate::config::ConfigError;

pub const NOT_CONFIGURED_MESSAGE: &str =
    "Email transporter not configured. Please set SENDGRID_API_KEY or EMAIL_HOST/EMAIL_USER/EMAIL_PASS.";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("{}", NOT_CONFIGURED_MESSAGE)]
    NotConfigured,

    #[error("Invalid email options: {0}")]
    InvalidMessage(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Delivery failed: {0}")]
    Delivery(ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rejection reported by the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    /// SMTP reply code, when the server answered.
    pub code: Option<String>,
    pub permanent: bool,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            permanent: false,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>, permanent: bool) -> Self {
        self.code = Some(code.into());
        self.permanent = permanent;
        self
    }
}

impl From<lettre::transport::smtp::Error> for ProviderError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        ProviderError {
            message: err.to_string(),
            code: err.status().map(|code| code.to_string()),
            permanent: err.is_permanent(),
        }
    }
}

impl From<ProviderError> for MailError {
    fn from(err: ProviderError) -> Self {
        MailError::Delivery(err)
    }
}

pub type Result<T> = std::result::Result<T, MailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_names_both_groups() {
        let message = MailError::NotConfigured.to_string();
        assert!(message.contains("SENDGRID_API_KEY"));
        assert!(message.contains("EMAIL_HOST/EMAIL_USER/EMAIL_PASS"));
    }

    #[test]
    fn test_delivery_keeps_provider_message() {
        let err: MailError = ProviderError::new("535 Authentication failed")
            .with_code("535", true)
            .into();

        assert_eq!(err.to_string(), "Delivery failed: 535 Authentication failed");
        match err {
            MailError::Delivery(provider) => {
                assert_eq!(provider.code.as_deref(), Some("535"));
                assert!(provider.permanent);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
