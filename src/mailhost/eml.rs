//! Mailbox directory loader: `.eml` files parsed with mail_parser.
//!
//! Messages are grouped into threads by normalized subject ("Re:"/"Fwd:"
//! prefixes stripped), ordered oldest-first inside a thread, and threads are
//! ordered newest-first so search results look like a webmail inbox.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use tracing::{debug, warn};

use crate::error::MailHostError;
use crate::mailhost::{InMemoryMailHost, MailMessage, MailThread};

/// Load every `.eml` file in `dir` into an in-memory host.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_mailbox_dir(dir: &Path) -> Result<InMemoryMailHost, MailHostError> {
    let entries = std::fs::read_dir(dir).map_err(|e| MailHostError::Load {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut messages = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("eml") {
            continue;
        }

        let raw = std::fs::read(&path)?;
        let fallback_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match parse_message(&raw, &fallback_id) {
            Some(msg) => messages.push(msg),
            None => warn!(path = %path.display(), "Skipping unparseable message"),
        }
    }

    debug!(count = messages.len(), dir = %dir.display(), "Loaded mailbox");
    Ok(InMemoryMailHost::with_threads(group_into_threads(messages)))
}

/// Parse one raw RFC 822 message into its header view.
pub fn parse_message(raw: &[u8], fallback_id: &str) -> Option<MailMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    let from = parsed
        .from()
        .and_then(|a| a.first())
        .and_then(format_addr)
        .unwrap_or_default();

    let reply_to = parsed
        .reply_to()
        .and_then(|a| a.first())
        .and_then(format_addr);

    let to = match parsed.to() {
        Some(mail_parser::Address::List(addrs)) => addrs.iter().filter_map(format_addr).collect(),
        Some(mail_parser::Address::Group(groups)) => groups
            .iter()
            .flat_map(|g| g.addresses.iter().filter_map(format_addr))
            .collect(),
        None => Vec::new(),
    };

    let id = parsed
        .message_id()
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback_id.to_string());

    let date = parsed
        .date()
        .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0));

    Some(MailMessage {
        id,
        from,
        reply_to,
        to,
        subject: parsed.subject().map(|s| s.to_string()),
        date,
    })
}

/// Render an address the way a raw header shows it.
fn format_addr(addr: &mail_parser::Addr) -> Option<String> {
    let address = addr.address()?;
    Some(match addr.name() {
        Some(name) if !name.is_empty() => format!("\"{name}\" <{address}>"),
        _ => address.to_string(),
    })
}

/// Strip any number of leading reply/forward prefixes.
pub fn normalize_subject(subject: &str) -> String {
    let mut s = subject.trim();
    loop {
        let lower = s.to_ascii_lowercase();
        let stripped = ["re:", "fwd:", "fw:", "odp:", "pd:"]
            .iter()
            .find(|p| lower.starts_with(*p))
            .map(|p| s[p.len()..].trim_start());
        match stripped {
            Some(rest) => s = rest,
            None => return s.trim_end().to_string(),
        }
    }
}

fn group_into_threads(messages: Vec<MailMessage>) -> Vec<MailThread> {
    let mut by_key: HashMap<String, Vec<MailMessage>> = HashMap::new();
    for msg in messages {
        let key = match msg.subject.as_deref().map(normalize_subject) {
            Some(subject) if !subject.is_empty() => subject,
            _ => format!("id:{}", msg.id),
        };
        by_key.entry(key).or_default().push(msg);
    }

    let mut threads: Vec<MailThread> = by_key
        .into_iter()
        .map(|(key, mut messages)| {
            messages.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
            MailThread::new(key, messages)
        })
        .collect();

    threads.sort_by(|a, b| {
        let latest = |t: &MailThread| t.messages.iter().filter_map(|m| m.date).max();
        latest(b).cmp(&latest(a)).then_with(|| a.id.cmp(&b.id))
    });
    threads
}
