use async_trait::async_trait;
use shared::protocol::{RelayReply, SubmissionRequest};

pub mod error;
pub mod extract;
mod http_api;
mod session;

pub use error::{ClientConfigError, SessionError, TransportError};
pub use http_api::HttpRsvpApi;
pub use session::{
    Confirmation, ConfirmationTone, RsvpSession, SessionPhase, NO_GUEST_MESSAGE,
    UNCONFIGURED_MESSAGE,
};

/// The two relay operations a session depends on. Replies are returned with
/// whatever status the relay gave; only a missing reply is an error here.
#[async_trait]
pub trait RsvpApi: Send + Sync {
    async fn lookup(&self, guest: &str) -> Result<RelayReply, TransportError>;
    async fn submit(&self, request: &SubmissionRequest) -> Result<RelayReply, TransportError>;
}
