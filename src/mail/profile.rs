//! Transport selection.
//!
//! Exactly one profile is chosen per process, in fixed priority order:
//! SendGrid API key, then a custom SMTP host with credentials, then a bare
//! user/password pair (Gmail). Anything else is `Unconfigured`.

use crate::config::Config;

pub const SENDGRID_HOST: &str = "smtp.sendgrid.net";
pub const SENDGRID_PORT: u16 = 587;
/// SendGrid expects this literal username alongside the API key.
pub const SENDGRID_USER: &str = "apikey";

pub const GMAIL_HOST: &str = "smtp.gmail.com";
pub const GMAIL_PORT: u16 = 465;

pub const DEFAULT_SMTP_PORT: u16 = 465;

/// How to reach the mail provider.
#[derive(Clone, PartialEq, Eq)]
pub enum TransportProfile {
    SendGridSmtp {
        api_key: String,
    },
    CustomSmtp {
        host: String,
        port: u16,
        secure: bool,
        user: String,
        pass: String,
    },
    GmailService {
        user: String,
        pass: String,
    },
    Unconfigured,
}

/// Pick the transport profile for `config`. First match wins.
pub fn select_profile(config: &Config) -> TransportProfile {
    if let Some(api_key) = &config.sendgrid_api_key {
        return TransportProfile::SendGridSmtp {
            api_key: api_key.clone(),
        };
    }

    match (&config.email_host, &config.email_user, &config.email_pass) {
        (Some(host), Some(user), Some(pass)) => {
            let port = config.email_port.unwrap_or(DEFAULT_SMTP_PORT);
            TransportProfile::CustomSmtp {
                host: host.clone(),
                port,
                secure: config.email_secure.unwrap_or(port == 465),
                user: user.clone(),
                pass: pass.clone(),
            }
        }
        (_, Some(user), Some(pass)) => TransportProfile::GmailService {
            user: user.clone(),
            pass: pass.clone(),
        },
        _ => TransportProfile::Unconfigured,
    }
}

impl TransportProfile {
    pub fn is_configured(&self) -> bool {
        !matches!(self, TransportProfile::Unconfigured)
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            TransportProfile::SendGridSmtp { .. } => Some(SENDGRID_HOST),
            TransportProfile::CustomSmtp { host, .. } => Some(host.as_str()),
            TransportProfile::GmailService { .. } => Some(GMAIL_HOST),
            TransportProfile::Unconfigured => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            TransportProfile::SendGridSmtp { .. } => Some(SENDGRID_PORT),
            TransportProfile::CustomSmtp { port, .. } => Some(*port),
            TransportProfile::GmailService { .. } => Some(GMAIL_PORT),
            TransportProfile::Unconfigured => None,
        }
    }

    /// Implicit TLS (`true`) or plaintext upgraded with STARTTLS (`false`).
    pub fn secure(&self) -> bool {
        match self {
            TransportProfile::SendGridSmtp { .. } => false,
            TransportProfile::CustomSmtp { secure, .. } => *secure,
            TransportProfile::GmailService { .. } => true,
            TransportProfile::Unconfigured => false,
        }
    }

    /// `(user, password)` for SMTP AUTH.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self {
            TransportProfile::SendGridSmtp { api_key } => Some((SENDGRID_USER, api_key.as_str())),
            TransportProfile::CustomSmtp { user, pass, .. }
            | TransportProfile::GmailService { user, pass } => Some((user.as_str(), pass.as_str())),
            TransportProfile::Unconfigured => None,
        }
    }

    /// Log-safe provider description. Never contains credentials.
    pub fn describe(&self) -> String {
        match self {
            TransportProfile::SendGridSmtp { .. } => "sendgrid-smtp".to_string(),
            TransportProfile::CustomSmtp { host, port, .. } => format!("{}:{}", host, port),
            TransportProfile::GmailService { .. } => "gmail-service".to_string(),
            TransportProfile::Unconfigured => "none".to_string(),
        }
    }
}

impl std::fmt::Debug for TransportProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportProfile::SendGridSmtp { .. } => f
                .debug_struct("SendGridSmtp")
                .field("api_key", &"***")
                .finish(),
            TransportProfile::CustomSmtp {
                host,
                port,
                secure,
                user,
                ..
            } => f
                .debug_struct("CustomSmtp")
                .field("host", host)
                .field("port", port)
                .field("secure", secure)
                .field("user", user)
                .field("pass", &"***")
                .finish(),
            TransportProfile::GmailService { user, .. } => f
                .debug_struct("GmailService")
                .field("user", user)
                .field("pass", &"***")
                .finish(),
            TransportProfile::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

impl std::fmt::Display for TransportProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_config() -> Config {
        Config {
            sendgrid_api_key: None,
            email_host: Some("mail.blog.dev".to_string()),
            email_port: None,
            email_secure: None,
            email_user: Some("me@blog.dev".to_string()),
            email_pass: Some("hunter2".to_string()),
            email_from: None,
            email_from_name: "Blogify".to_string(),
            timeout_seconds: 30,
        }
    }

    #[test]
    fn test_sendgrid_wins_over_everything() {
        let config = Config {
            sendgrid_api_key: Some("SG.key".to_string()),
            ..full_config()
        };

        let profile = select_profile(&config);
        assert_eq!(
            profile,
            TransportProfile::SendGridSmtp {
                api_key: "SG.key".to_string()
            }
        );
        assert_eq!(profile.host(), Some(SENDGRID_HOST));
        assert_eq!(profile.port(), Some(587));
        assert!(!profile.secure());
        assert_eq!(profile.credentials(), Some(("apikey", "SG.key")));
    }

    #[test]
    fn test_custom_smtp_defaults_to_465_and_tls() {
        let profile = select_profile(&full_config());

        assert_eq!(
            profile,
            TransportProfile::CustomSmtp {
                host: "mail.blog.dev".to_string(),
                port: 465,
                secure: true,
                user: "me@blog.dev".to_string(),
                pass: "hunter2".to_string(),
            }
        );
    }

    #[test]
    fn test_custom_smtp_secure_follows_port() {
        let config = Config {
            email_port: Some(587),
            ..full_config()
        };
        assert!(!select_profile(&config).secure());

        let forced = Config {
            email_port: Some(587),
            email_secure: Some(true),
            ..full_config()
        };
        assert!(select_profile(&forced).secure());

        let plain_465 = Config {
            email_secure: Some(false),
            ..full_config()
        };
        assert!(!select_profile(&plain_465).secure());
    }

    #[test]
    fn test_user_and_pass_only_selects_gmail() {
        let config = Config {
            email_host: None,
            ..full_config()
        };

        let profile = select_profile(&config);
        assert!(matches!(profile, TransportProfile::GmailService { .. }));
        assert_eq!(profile.host(), Some(GMAIL_HOST));
        assert_eq!(profile.port(), Some(465));
        assert!(profile.secure());
    }

    #[test]
    fn test_partial_settings_are_unconfigured() {
        assert_eq!(select_profile(&Config::default()), TransportProfile::Unconfigured);

        let host_without_pass = Config {
            email_pass: None,
            ..full_config()
        };
        assert_eq!(select_profile(&host_without_pass), TransportProfile::Unconfigured);
    }

    #[test]
    fn test_describe_and_debug_hide_secrets() {
        let profiles = [
            select_profile(&Config {
                sendgrid_api_key: Some("SG.key".to_string()),
                ..full_config()
            }),
            select_profile(&full_config()),
            select_profile(&Config {
                email_host: None,
                ..full_config()
            }),
        ];

        let descriptions: Vec<String> = profiles.iter().map(|p| p.describe()).collect();
        assert_eq!(
            descriptions,
            vec!["sendgrid-smtp", "mail.blog.dev:465", "gmail-service"]
        );

        for profile in &profiles {
            let debug = format!("{:?}", profile);
            assert!(!debug.contains("SG.key"));
            assert!(!debug.contains("hunter2"));
        }
        assert_eq!(TransportProfile::Unconfigured.describe(), "none");
    }
}
