//! Mail host abstraction: the mailbox the inspected message lives in.
//!
//! The lookup only needs two things from it: the headers of one message and
//! a bounded history search. Backends:
//! - `InMemoryMailHost`: threads held in memory (tests, embedding)
//! - `eml::load_mailbox_dir()`: a directory of `.eml` files

pub mod eml;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::MailHostError;

pub use memory::InMemoryMailHost;

/// Header view of one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Host-specific message ID.
    pub id: String,
    /// Raw `From` header value (may include a display name).
    pub from: String,
    /// Raw `Reply-To` header value, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Raw `To` header values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl MailMessage {
    pub fn new(id: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            ..Default::default()
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Reply-To header, or an empty string when absent.
    pub fn reply_to_header(&self) -> &str {
        self.reply_to.as_deref().unwrap_or_default()
    }
}

/// A conversation: messages in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailThread {
    pub id: String,
    pub messages: Vec<MailMessage>,
}

impl MailThread {
    pub fn new(id: impl Into<String>, messages: Vec<MailMessage>) -> Self {
        Self {
            id: id.into(),
            messages,
        }
    }

    pub fn first_message(&self) -> Option<&MailMessage> {
        self.messages.first()
    }
}

/// Read-only access to a mailbox.
#[async_trait]
pub trait MailHost: Send + Sync {
    /// Fetch one message by ID. The access token is passed through opaque.
    async fn get_message(
        &self,
        message_id: &str,
        access_token: Option<&SecretString>,
    ) -> Result<MailMessage, MailHostError>;

    /// Threads matching `query`, newest first, paged by `offset`/`limit`.
    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MailThread>, MailHostError>;
}
