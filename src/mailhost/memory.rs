//! In-memory mail host.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::MailHostError;
use crate::mailhost::{MailHost, MailMessage, MailThread};

/// Mail host over a fixed list of threads, kept in search order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailHost {
    threads: Vec<MailThread>,
}

impl InMemoryMailHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(threads: Vec<MailThread>) -> Self {
        Self { threads }
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    fn find_message(&self, message_id: &str) -> Option<&MailMessage> {
        self.threads
            .iter()
            .flat_map(|t| t.messages.iter())
            .find(|m| m.id == message_id)
    }
}

/// Whether any address header of `message` mentions `query` (case-insensitive).
fn mentions(message: &MailMessage, query: &str) -> bool {
    std::iter::once(message.from.as_str())
        .chain(message.reply_to.as_deref())
        .chain(message.to.iter().map(String::as_str))
        .any(|h| h.to_lowercase().contains(query))
}

#[async_trait]
impl MailHost for InMemoryMailHost {
    async fn get_message(
        &self,
        message_id: &str,
        _access_token: Option<&SecretString>,
    ) -> Result<MailMessage, MailHostError> {
        self.find_message(message_id)
            .cloned()
            .ok_or_else(|| MailHostError::MessageNotFound {
                id: message_id.to_string(),
            })
    }

    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MailThread>, MailHostError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .threads
            .iter()
            .filter(|t| t.messages.iter().any(|m| mentions(m, &query)))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
