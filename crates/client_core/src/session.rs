use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{AttendanceDecision, GuestAllowance},
    protocol::{RelayReply, SubmissionRequest, SubmissionResult},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::SessionError,
    extract::{extract_message, Extractor, LOOKUP_CHAIN, SUBMISSION_CHAIN},
    RsvpApi,
};

pub const NO_GUEST_MESSAGE: &str = "No guest specified in link.";
pub const UNCONFIGURED_MESSAGE: &str = "Could not load invitation details.";
const UNKNOWN_SUBMISSION_FAILURE: &str = "Unknown server error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationTone {
    Celebration,
    Regret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub decision: AttendanceDecision,
    pub tone: ConfirmationTone,
    pub heading: String,
    pub message: String,
}

impl Confirmation {
    pub fn new(allowance: &GuestAllowance, decision: AttendanceDecision) -> Self {
        match decision {
            AttendanceDecision::Yes => Self {
                decision,
                tone: ConfirmationTone::Celebration,
                heading: "We Can't Wait!".to_string(),
                message: format!(
                    "Thank you, {}! We're delighted you'll be celebrating with us. Your {} seat(s) are confirmed.",
                    allowance.name, allowance.head_count
                ),
            },
            AttendanceDecision::No => Self {
                decision,
                tone: ConfirmationTone::Regret,
                heading: "Response Received".to_string(),
                message: format!(
                    "Thank you for letting us know, {}. You'll be missed!",
                    allowance.name
                ),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Error {
        message: String,
    },
    Loaded {
        allowance: GuestAllowance,
        /// Set when the previous submission attempt failed.
        last_error: Option<String>,
    },
    Submitting {
        allowance: GuestAllowance,
        choice: AttendanceDecision,
    },
    Confirmed {
        allowance: GuestAllowance,
        confirmation: Confirmation,
    },
}

impl SessionPhase {
    pub fn allowance(&self) -> Option<&GuestAllowance> {
        match self {
            SessionPhase::Loaded { allowance, .. }
            | SessionPhase::Submitting { allowance, .. }
            | SessionPhase::Confirmed { allowance, .. } => Some(allowance),
            SessionPhase::Loading | SessionPhase::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionPhase::Error { message } => Some(message),
            SessionPhase::Loaded { last_error, .. } => last_error.as_deref(),
            _ => None,
        }
    }

    /// The choice whose submission is pending, for per-button progress.
    pub fn in_flight_choice(&self) -> Option<AttendanceDecision> {
        match self {
            SessionPhase::Submitting { choice, .. } => Some(*choice),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SessionPhase::Confirmed { .. })
    }
}

/// One guest's lookup-then-respond lifecycle.
///
/// Every lookup bumps a generation counter under the phase lock; replies that
/// come back for an older generation are dropped.
pub struct RsvpSession {
    api: Option<Arc<dyn RsvpApi>>,
    phase: watch::Sender<SessionPhase>,
    generation: AtomicU64,
}

impl RsvpSession {
    pub fn new(api: Arc<dyn RsvpApi>) -> Self {
        Self::with_api(Some(api))
    }

    /// A session with no relay behind it. Every load ends in a generic error.
    pub fn unconfigured() -> Self {
        Self::with_api(None)
    }

    fn with_api(api: Option<Arc<dyn RsvpApi>>) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Loading);
        Self {
            api,
            phase,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.borrow().clone()
    }

    pub async fn load(&self, guest: Option<&str>) -> SessionPhase {
        let generation = self.begin_lookup();

        let Some(api) = self.api.as_ref() else {
            warn!("relay is not configured; skipping lookup");
            self.settle(generation, error_phase(UNCONFIGURED_MESSAGE));
            return self.phase();
        };
        let Some(guest) = guest.map(str::trim).filter(|guest| !guest.is_empty()) else {
            self.settle(generation, error_phase(NO_GUEST_MESSAGE));
            return self.phase();
        };

        debug!(generation, guest, "looking up guest allowance");
        let outcome = match api.lookup(guest).await {
            Ok(reply) => classify_lookup(&reply),
            Err(err) => Err(err.to_string()),
        };
        let next = match outcome {
            Ok(allowance) => SessionPhase::Loaded {
                allowance,
                last_error: None,
            },
            Err(message) => {
                error_phase(format!("Could not load invitation details: {message}"))
            }
        };

        self.settle(generation, next);
        self.phase()
    }

    pub async fn submit(
        &self,
        decision: AttendanceDecision,
    ) -> Result<SessionPhase, SessionError> {
        let api = self.api.as_ref().ok_or(SessionError::NotLoaded)?;

        let mut claim = Err(SessionError::NotLoaded);
        self.phase.send_if_modified(|phase| match phase {
            SessionPhase::Loaded { allowance, .. } => {
                let allowance = allowance.clone();
                claim = Ok((self.generation.load(Ordering::SeqCst), allowance.clone()));
                *phase = SessionPhase::Submitting {
                    allowance,
                    choice: decision,
                };
                true
            }
            SessionPhase::Submitting { .. } => {
                claim = Err(SessionError::SubmissionInFlight);
                false
            }
            SessionPhase::Confirmed { .. } => {
                claim = Err(SessionError::AlreadyConfirmed);
                false
            }
            SessionPhase::Loading | SessionPhase::Error { .. } => false,
        });
        let (generation, allowance) = claim.map_err(|err| {
            debug!(%err, ?decision, "submission refused");
            err
        })?;
        let pending = PendingSubmission {
            session: self,
            generation,
            allowance,
            settled: false,
        };

        debug!(generation, ?decision, "submitting attendance");
        let request = SubmissionRequest::new(pending.allowance.name.clone(), decision);
        let outcome = match api.submit(&request).await {
            Ok(reply) => classify_submission(&reply),
            Err(err) => Err(err.to_string()),
        };
        let allowance = pending.allowance.clone();
        let next = match outcome {
            Ok(()) => SessionPhase::Confirmed {
                confirmation: Confirmation::new(&allowance, decision),
                allowance,
            },
            Err(message) => SessionPhase::Loaded {
                allowance,
                last_error: Some(format!(
                    "RSVP submission failed: {message}. Please try again."
                )),
            },
        };

        pending.settle(next);
        Ok(self.phase())
    }

    fn begin_lookup(&self) -> u64 {
        let mut generation = 0;
        self.phase.send_modify(|phase| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *phase = SessionPhase::Loading;
        });
        generation
    }

    fn settle(&self, generation: u64, next: SessionPhase) -> bool {
        self.phase.send_if_modified(|phase| {
            let current = self.generation.load(Ordering::SeqCst);
            if current != generation {
                debug!(generation, current, "discarding superseded result");
                return false;
            }
            *phase = next;
            true
        })
    }
}

/// Claim on the `Submitting` phase. Dropping it unsettled (the submit future
/// was cancelled) hands the phase back as `Loaded` so the guest can retry.
struct PendingSubmission<'a> {
    session: &'a RsvpSession,
    generation: u64,
    allowance: GuestAllowance,
    settled: bool,
}

impl PendingSubmission<'_> {
    fn settle(mut self, next: SessionPhase) {
        self.settled = true;
        self.session.settle(self.generation, next);
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let restored = self.session.phase.send_if_modified(|phase| {
            let current = self.session.generation.load(Ordering::SeqCst);
            if current != self.generation || !matches!(phase, SessionPhase::Submitting { .. }) {
                return false;
            }
            *phase = SessionPhase::Loaded {
                allowance: self.allowance.clone(),
                last_error: None,
            };
            true
        });
        if restored {
            debug!(generation = self.generation, "submission abandoned; phase restored");
        }
    }
}

fn error_phase(message: impl Into<String>) -> SessionPhase {
    SessionPhase::Error {
        message: message.into(),
    }
}

fn classify_lookup(reply: &RelayReply) -> Result<GuestAllowance, String> {
    if !reply.is_success() {
        return Err(extract_message(LOOKUP_CHAIN, reply));
    }
    if let Some(message) = Extractor::Field("error").extract(reply) {
        return Err(message);
    }

    let allowance: GuestAllowance = reply.decode().ok_or_else(|| {
        format!(
            "unexpected reply: {}",
            extract_message(LOOKUP_CHAIN, reply)
        )
    })?;
    allowance.validate().map_err(|err| err.to_string())?;
    Ok(allowance)
}

fn classify_submission(reply: &RelayReply) -> Result<(), String> {
    if !reply.is_success() {
        return Err(extract_message(SUBMISSION_CHAIN, reply));
    }

    match reply.decode::<SubmissionResult>() {
        Some(result) if result.is_success() => Ok(()),
        Some(result) => Err(result
            .message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| UNKNOWN_SUBMISSION_FAILURE.to_string())),
        None => Err(format!(
            "unexpected reply: {}",
            extract_message(SUBMISSION_CHAIN, reply)
        )),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
