//! Human-readable messages pulled out of failed relay replies.
//!
//! Each extractor is a pure function of the reply. A chain is tried in order
//! and the first extractor that yields a message wins.

use shared::protocol::RelayReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// A top-level string field of a structured body.
    Field(&'static str),
    /// The body exactly as received.
    RawText,
    /// `Server error <status>`.
    StatusFallback,
}

pub const LOOKUP_CHAIN: &[Extractor] = &[
    Extractor::Field("error"),
    Extractor::Field("message"),
    Extractor::RawText,
    Extractor::StatusFallback,
];

pub const SUBMISSION_CHAIN: &[Extractor] = &[
    Extractor::Field("message"),
    Extractor::Field("error"),
    Extractor::RawText,
    Extractor::StatusFallback,
];

impl Extractor {
    pub fn extract(self, reply: &RelayReply) -> Option<String> {
        match self {
            Extractor::Field(name) => explicit_field(reply, name),
            Extractor::RawText => raw_text(reply),
            Extractor::StatusFallback => Some(status_fallback(reply.status)),
        }
    }
}

pub fn explicit_field(reply: &RelayReply, name: &str) -> Option<String> {
    reply.string_field(name)
}

pub fn raw_text(reply: &RelayReply) -> Option<String> {
    reply.raw_text()
}

pub fn status_fallback(status: u16) -> String {
    format!("Server error {status}")
}

pub fn extract_message(chain: &[Extractor], reply: &RelayReply) -> String {
    chain
        .iter()
        .find_map(|extractor| extractor.extract(reply))
        .unwrap_or_else(|| status_fallback(reply.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_error_field_wins_for_lookups() {
        let reply = RelayReply::json(404, json!({ "error": "Guest not found", "message": "x" }));
        assert_eq!(extract_message(LOOKUP_CHAIN, &reply), "Guest not found");
    }

    #[test]
    fn submission_chain_prefers_message() {
        let reply = RelayReply::json(500, json!({ "status": "error", "message": "Sheet locked" }));
        assert_eq!(extract_message(SUBMISSION_CHAIN, &reply), "Sheet locked");
    }

    #[test]
    fn structured_body_without_known_fields_falls_back_to_text() {
        let text = r#"{"status": "error", "detail": "Sheet locked"}"#;
        let reply = RelayReply::from_text(400, text);
        assert_eq!(extract_message(LOOKUP_CHAIN, &reply), text);
    }

    #[test]
    fn raw_text_is_used_when_body_is_not_structured() {
        let reply = RelayReply::from_text(502, "upstream exploded");
        assert_eq!(explicit_field(&reply, "error"), None);
        assert_eq!(extract_message(LOOKUP_CHAIN, &reply), "upstream exploded");
    }

    #[test]
    fn empty_body_uses_status_fallback() {
        let reply = RelayReply::from_text(503, "  ");
        assert_eq!(raw_text(&reply), None);
        assert_eq!(extract_message(SUBMISSION_CHAIN, &reply), "Server error 503");
        assert_eq!(extract_message(&[], &reply), "Server error 503");
    }
}
