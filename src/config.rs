use std::env;

pub const DEFAULT_FROM_NAME: &str = "Blogify";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Mail settings read once at startup.
///
/// Every key is optional; an empty value counts as unset.
#[derive(Clone)]
pub struct Config {
    pub sendgrid_api_key: Option<String>,
    pub email_host: Option<String>,
    pub email_port: Option<u16>,
    pub email_secure: Option<bool>,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub email_from: Option<String>,
    pub email_from_name: String,
    pub timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let email_port = match get("EMAIL_PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Config {
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            email_host: get("EMAIL_HOST"),
            email_port,
            email_secure: get("EMAIL_SECURE").map(|raw| raw == "true"),
            email_user: get("EMAIL_USER"),
            email_pass: get("EMAIL_PASS"),
            email_from: get("EMAIL_FROM"),
            email_from_name: get("EMAIL_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            timeout_seconds: get("EMAIL_TIMEOUT_SECONDS")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Sender used when a message does not carry its own `from`.
    pub fn default_from(&self) -> String {
        if let Some(from) = &self.email_from {
            return from.clone();
        }
        let address = self.email_user.as_deref().unwrap_or("no-reply@example.com");
        format!("\"{}\" <{}>", self.email_from_name, address)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sendgrid_api_key: None,
            email_host: None,
            email_port: None,
            email_secure: None,
            email_user: None,
            email_pass: None,
            email_from: None,
            email_from_name: DEFAULT_FROM_NAME.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sendgrid_api_key", &self.sendgrid_api_key.as_ref().map(|_| "***"))
            .field("email_host", &self.email_host)
            .field("email_port", &self.email_port)
            .field("email_secure", &self.email_secure)
            .field("email_user", &self.email_user)
            .field("email_pass", &self.email_pass.as_ref().map(|_| "***"))
            .field("email_from", &self.email_from)
            .field("email_from_name", &self.email_from_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EMAIL_PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_from(&[("EMAIL_HOST", ""), ("EMAIL_USER", "me@blog.dev")])
            .expect("Should load config");

        assert!(config.email_host.is_none());
        assert_eq!(config.email_user.as_deref(), Some("me@blog.dev"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = config_from(&[("EMAIL_PORT", "smtp")]);
        assert!(matches!(result, Err(ConfigError::InvalidPort(raw)) if raw == "smtp"));
    }

    #[test]
    fn test_secure_only_true_string_is_true() {
        let on = config_from(&[("EMAIL_SECURE", "true")]).unwrap();
        let off = config_from(&[("EMAIL_SECURE", "TRUE")]).unwrap();
        let unset = config_from(&[]).unwrap();

        assert_eq!(on.email_secure, Some(true));
        assert_eq!(off.email_secure, Some(false));
        assert_eq!(unset.email_secure, None);
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("EMAIL_TIMEOUT_SECONDS", "soon")]).unwrap();

        assert_eq!(config.email_from_name, DEFAULT_FROM_NAME);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_default_from_resolution() {
        let explicit = config_from(&[
            ("EMAIL_FROM", "News <news@blog.dev>"),
            ("EMAIL_USER", "me@blog.dev"),
        ])
        .unwrap();
        assert_eq!(explicit.default_from(), "News <news@blog.dev>");

        let from_user = config_from(&[("EMAIL_USER", "me@blog.dev")]).unwrap();
        assert_eq!(from_user.default_from(), "\"Blogify\" <me@blog.dev>");

        let fallback = config_from(&[]).unwrap();
        assert_eq!(fallback.default_from(), "\"Blogify\" <no-reply@example.com>");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = config_from(&[
            ("SENDGRID_API_KEY", "SG.secret"),
            ("EMAIL_PASS", "hunter2"),
        ])
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("SG.secret"));
        assert!(!rendered.contains("hunter2"));
    }
}
