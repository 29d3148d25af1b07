use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::AttendanceDecision;

pub const LOOKUP_MODE: &str = "getAllowance";
pub const SUBMISSION_MODE: &str = "rsvp";
pub const SUCCESS_STATUS: &str = "success";

/// Query string the session sends to resolve a guest allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub mode: String,
    pub guest: String,
}

impl LookupQuery {
    pub fn for_guest(guest: impl Into<String>) -> Self {
        Self {
            mode: LOOKUP_MODE.to_string(),
            guest: guest.into(),
        }
    }

    pub fn pairs(&self) -> [(&str, &str); 2] {
        [("mode", self.mode.as_str()), ("guest", self.guest.as_str())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub mode: String,
    pub guest: String,
    pub attending: AttendanceDecision,
}

impl SubmissionRequest {
    pub fn new(guest: impl Into<String>, attending: AttendanceDecision) -> Self {
        Self {
            mode: SUBMISSION_MODE.to_string(),
            guest: guest.into(),
            attending,
        }
    }
}

/// Ledger reply to a submission. A body with no `status` is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// Parsed body together with the exact text it was parsed from.
    Json { value: Value, raw: String },
    Text(String),
}

/// A ledger reply as the relay hands it on: the upstream status plus either
/// the parsed JSON body or the raw text when parsing failed. The received text
/// is kept in both cases so it can be passed on byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl RelayReply {
    pub fn from_text(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => ReplyBody::Json { value, raw: text },
            Err(_) => ReplyBody::Text(text),
        };
        Self { status, body }
    }

    pub fn json(status: u16, value: Value) -> Self {
        let raw = value.to_string();
        Self {
            status,
            body: ReplyBody::Json { value, raw },
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match &self.body {
            ReplyBody::Json { value, .. } => Some(value),
            ReplyBody::Text(_) => None,
        }
    }

    /// Top-level field of a JSON object body. Empty strings, `null` and
    /// `false` count as absent.
    pub fn string_field(&self, name: &str) -> Option<String> {
        match self.as_json()?.get(name)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Body exactly as received, for both JSON and text replies.
    pub fn raw(&self) -> &str {
        match &self.body {
            ReplyBody::Json { raw, .. } => raw,
            ReplyBody::Text(text) => text,
        }
    }

    pub fn raw_text(&self) -> Option<String> {
        let text = self.raw();
        if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.as_json()?.clone()).ok()
    }
}
