use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayErrorCode {
    InvalidJsonPayload,
    MethodNotAllowed,
    UpstreamUnreachable,
    UpstreamBodyUnreadable,
}

/// Error object the relay produces itself, as opposed to errors mirrored
/// from the ledger service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayErrorBody {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<RelayErrorCode>,
}

impl RelayErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: RelayErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
