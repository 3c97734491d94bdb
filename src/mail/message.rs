use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Mailboxes, MultiPart, SinglePart};
use lettre::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MailError, Result};

/// An email to send. `to` may list several comma-separated recipients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Overrides the configured sender for this message only.
    #[serde(default)]
    pub from: Option<String>,
}

impl OutgoingMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Required fields: `to`, `subject` and at least one of `html`/`text`.
    pub fn validate(&self) -> Result<()> {
        if self.to.trim().is_empty() {
            return Err(MailError::InvalidMessage("'to' is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(MailError::InvalidMessage("'subject' is required".to_string()));
        }
        if non_empty(&self.html).is_none() && non_empty(&self.text).is_none() {
            return Err(MailError::InvalidMessage(
                "'html' or 'text' is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse the recipient list. Quoted display names may contain commas.
    pub fn recipients(&self) -> Result<Vec<Mailbox>> {
        let recipients: Vec<Mailbox> = self
            .to
            .trim()
            .parse::<Mailboxes>()
            .map_err(|e| MailError::InvalidMessage(format!("invalid recipient {:?}: {}", self.to, e)))?
            .into_iter()
            .collect();

        if recipients.is_empty() {
            return Err(MailError::InvalidMessage("'to' is required".to_string()));
        }
        Ok(recipients)
    }

    /// Validate and turn into a wire-ready message, falling back to `default_from`.
    pub(crate) fn prepare(&self, default_from: &str) -> Result<PreparedMessage> {
        self.validate()?;

        let raw_from = non_empty(&self.from).unwrap_or(default_from);
        let from = raw_from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidMessage(format!("invalid sender {:?}: {}", raw_from, e)))?;
        let recipients = self.recipients()?;
        let accepted = recipients.iter().map(|mb| mb.email.to_string()).collect();

        let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());
        let mut builder = Message::builder()
            .from(from)
            .subject(self.subject.as_str())
            .message_id(Some(message_id.clone()));
        for recipient in recipients {
            builder = builder.to(recipient);
        }

        let built = match (non_empty(&self.html), non_empty(&self.text)) {
            (Some(html), Some(text)) => builder.multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            )),
            (Some(html), None) => builder.singlepart(SinglePart::html(html.to_string())),
            (None, Some(text)) => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.to_string()),
            (None, None) => {
                return Err(MailError::InvalidMessage(
                    "'html' or 'text' is required".to_string(),
                ))
            }
        };
        let message = built
            .map_err(|e| MailError::InvalidMessage(format!("failed to build message: {}", e)))?;

        Ok(PreparedMessage {
            message,
            message_id,
            accepted,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub(crate) struct PreparedMessage {
    pub message: Message,
    pub message_id: String,
    pub accepted: Vec<String>,
}

/// Receipt for a message the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    pub message_id: String,
    pub accepted: Vec<String>,
    pub response_code: Option<String>,
    pub response: Vec<String>,
    pub sent_at: DateTime<Utc>,
}
