use super::*;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::AttendanceDecision;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{ClientConfigError, RsvpSession, SessionPhase};

#[derive(Clone, Default)]
struct RelayLog {
    lookups: Arc<Mutex<Vec<LookupQuery>>>,
    submissions: Arc<Mutex<Vec<Value>>>,
}

async fn fake_lookup(
    State(log): State<RelayLog>,
    Query(query): Query<LookupQuery>,
) -> (StatusCode, Json<Value>) {
    log.lookups.lock().await.push(query.clone());
    if query.guest == "Jane Doe" {
        (
            StatusCode::OK,
            Json(json!({ "name": "Jane Doe", "headCount": 2 })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "error": format!("Guest '{}' not found", query.guest) })),
        )
    }
}

async fn fake_submit(State(log): State<RelayLog>, Json(body): Json<Value>) -> Json<Value> {
    log.submissions.lock().await.push(body);
    Json(json!({ "status": "success" }))
}

async fn spawn_fake_relay() -> (String, RelayLog) {
    let log = RelayLog::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/rsvp", get(fake_lookup).post(fake_submit))
        .with_state(log.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), log)
}

#[test]
fn blank_or_invalid_relay_url_is_a_config_error() {
    assert!(matches!(
        HttpRsvpApi::new("  "),
        Err(ClientConfigError::MissingRelayUrl)
    ));
    assert!(matches!(
        HttpRsvpApi::new("relay.example"),
        Err(ClientConfigError::InvalidRelayUrl { .. })
    ));
}

#[test]
fn relay_url_must_be_http_or_https() {
    for url in ["ftp://wedding.example", "file:///tmp/relay"] {
        assert!(
            matches!(
                HttpRsvpApi::new(url),
                Err(ClientConfigError::UnsupportedScheme { .. })
            ),
            "{url}"
        );
    }
    assert!(HttpRsvpApi::new("http://127.0.0.1:8080").is_ok());
}

#[test]
fn rsvp_endpoint_is_resolved_under_the_base_path() {
    let api = HttpRsvpApi::new("https://wedding.example").expect("api");
    assert_eq!(api.rsvp_url().as_str(), "https://wedding.example/rsvp");

    let api = HttpRsvpApi::new("https://wedding.example/api").expect("api");
    assert_eq!(api.rsvp_url().as_str(), "https://wedding.example/api/rsvp");
}

#[test]
fn lookup_url_encodes_the_guest_name() {
    let api = HttpRsvpApi::new("https://wedding.example").expect("api");
    let url = api.lookup_url("Zoë & Max");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("mode".to_string(), "getAllowance".to_string()),
            ("guest".to_string(), "Zoë & Max".to_string()),
        ]
    );
    assert!(!url.as_str().contains(' '));
}

#[tokio::test]
async fn jane_doe_accepts_end_to_end() {
    let (relay_url, log) = spawn_fake_relay().await;
    let api = HttpRsvpApi::new(&relay_url).expect("api");
    let session = RsvpSession::new(Arc::new(api));

    let loaded = session.load(Some("Jane Doe")).await;
    assert_eq!(
        loaded.allowance().map(|a| (a.name.as_str(), a.head_count)),
        Some(("Jane Doe", 2))
    );

    let phase = session
        .submit(AttendanceDecision::Yes)
        .await
        .expect("submit");
    let SessionPhase::Confirmed { confirmation, .. } = &phase else {
        panic!("expected confirmation, got {phase:?}");
    };
    assert!(confirmation.message.contains("Jane Doe"));
    assert!(confirmation.message.contains('2'));

    assert_eq!(
        *log.lookups.lock().await,
        vec![LookupQuery::for_guest("Jane Doe")]
    );
    assert_eq!(
        *log.submissions.lock().await,
        vec![json!({ "mode": "rsvp", "guest": "Jane Doe", "attending": "Yes" })]
    );
}

#[tokio::test]
async fn unknown_guest_surfaces_ledger_error() {
    let (relay_url, _log) = spawn_fake_relay().await;
    let session = RsvpSession::new(Arc::new(HttpRsvpApi::new(&relay_url).expect("api")));

    let phase = session.load(Some("Mallory")).await;
    assert_eq!(
        phase.error_message(),
        Some("Could not load invitation details: Guest 'Mallory' not found")
    );
}

#[tokio::test]
async fn unreachable_relay_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpRsvpApi::new(&format!("http://{addr}")).expect("api");
    let err = api.lookup("Jane Doe").await.expect_err("should fail");
    assert!(matches!(err, TransportError::Request(_)));
}
