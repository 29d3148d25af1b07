use std::{process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{ConfirmationTone, HttpRsvpApi, RsvpSession, SessionPhase};
use shared::domain::AttendanceDecision;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Look up an invitation through the relay and optionally answer it.
#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the relay.
    #[arg(long, env = "RSVP_RELAY_URL")]
    relay_url: Option<String>,
    /// Guest name exactly as it appears in the invitation link.
    #[arg(long)]
    guest: Option<String>,
    /// Answer to submit once the invitation has loaded (yes/no).
    #[arg(long)]
    attend: Option<AttendanceDecision>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let session = match args.relay_url.as_deref().map(HttpRsvpApi::new) {
        Some(Ok(api)) => RsvpSession::new(Arc::new(api)),
        Some(Err(error)) => {
            error!(%error, "relay URL rejected");
            RsvpSession::unconfigured()
        }
        None => {
            warn!("no relay URL given");
            RsvpSession::unconfigured()
        }
    };

    let mut phase = session.load(args.guest.as_deref()).await;
    render(&phase);

    if let (Some(decision), SessionPhase::Loaded { .. }) = (args.attend, &phase) {
        println!("Sending \"{decision}\"...");
        phase = session.submit(decision).await?;
        render(&phase);
    }

    Ok(match phase {
        SessionPhase::Error { .. } => ExitCode::FAILURE,
        SessionPhase::Loaded {
            last_error: Some(_),
            ..
        } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn render(phase: &SessionPhase) {
    match phase {
        SessionPhase::Loading => println!("Loading your details..."),
        SessionPhase::Error { message } => println!("Oops! {message}"),
        SessionPhase::Loaded {
            allowance,
            last_error,
        } => {
            if let Some(message) = last_error {
                println!("Oops! {message}");
            }
            println!("Hello {},", allowance.name);
            println!(
                "We have joyfully reserved {} in your honour.",
                allowance.seat_label()
            );
            println!("Will you be joining us? (--attend yes|no)");
        }
        SessionPhase::Submitting { choice, .. } => println!("Processing \"{choice}\"..."),
        SessionPhase::Confirmed { confirmation, .. } => {
            let marker = match confirmation.tone {
                ConfirmationTone::Celebration => "*",
                ConfirmationTone::Regret => "-",
            };
            println!("{marker} {}", confirmation.heading);
            println!("{}", confirmation.message);
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
