pub mod config;
pub mod error;
pub mod mail;

pub use config::{Config, ConfigError};
pub use error::{MailError, ProviderError, Result};
pub use mail::{
    select_profile, MailTransport, Mailer, OutgoingMessage, ProviderReceipt, Readiness,
    SendResult, TransportProfile,
};
