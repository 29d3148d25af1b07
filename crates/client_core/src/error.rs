use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("relay URL is not configured")]
    MissingRelayUrl,
    #[error("relay URL '{url}' is invalid: {source}")]
    InvalidRelayUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("relay URL '{url}' must use http or https")]
    UnsupportedScheme { url: String },
}

/// Failure to get any reply out of the relay at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invitation details are not loaded")]
    NotLoaded,
    #[error("a response is already being submitted")]
    SubmissionInFlight,
    #[error("the response has already been confirmed")]
    AlreadyConfirmed,
}
