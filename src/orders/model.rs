//! Order records and the query date window.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock format the order API expects for `date_from`/`date_to`.
pub const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Order identifier as the API sent it.
///
/// Usually a number; strings are accepted, and any other shape is kept
/// verbatim so no order is lost to an unexpected id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderId {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// One order, passed through read-only.
///
/// Deserializing any JSON object succeeds: the displayed fields are kept as
/// loosely typed values and read through accessors, everything else lands in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Order {
    pub fn new(id: impl Into<OrderId>) -> Self {
        Self {
            id: Some(id.into()),
            date: None,
            status: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(serde_json::Value::String(date.into()));
        self
    }

    pub fn with_status(mut self, name: impl Into<String>) -> Self {
        self.status = Some(serde_json::json!({ "name": name.into() }));
        self
    }

    /// Id as display text.
    pub fn id_text(&self) -> Option<String> {
        self.id.as_ref().map(ToString::to_string)
    }

    /// `status.name`, or the status itself when the API sent a bare string.
    pub fn status_name(&self) -> Option<&str> {
        match self.status.as_ref()? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Object(map) => map.get("name").and_then(|n| n.as_str()),
            _ => None,
        }
    }

    /// Date as display text; non-string dates are shown as their JSON form.
    pub fn date_text(&self) -> Option<String> {
        match self.date.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<i64> for OrderId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Inclusive `[from, to]` range for order queries. `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: NaiveDateTime,
    to: NaiveDateTime,
}

impl DateWindow {
    /// Window between two instants; a `from` later than `to` is clamped.
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self {
            from: from.min(to),
            to,
        }
    }

    /// From midnight UTC of `start` until `now`, truncated to whole seconds.
    pub fn since(start: NaiveDate, now: DateTime<Utc>) -> Self {
        let now = now.naive_utc();
        let to = now.with_nanosecond(0).unwrap_or(now);
        Self::new(start.and_time(chrono::NaiveTime::MIN), to)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.from
    }

    pub fn end(&self) -> NaiveDateTime {
        self.to
    }

    pub fn from_param(&self) -> String {
        self.from.format(WINDOW_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format(WINDOW_FORMAT).to_string()
    }
}
