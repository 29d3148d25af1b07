use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use shared::protocol::{RelayReply, ReplyBody};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod error;
mod relay;

use app_state::AppState;
use config::{load_settings, LedgerConfig};
use error::RelayError;
use relay::LedgerRelay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    let ledger = LedgerConfig::from_settings(&settings).map_err(|error| {
        error!(%error, "refusing to start without a ledger service");
        error
    })?;
    info!(
        ledger_host = ledger.url.host_str().unwrap_or_default(),
        "ledger relay configured"
    );

    let state = AppState {
        relay: LedgerRelay::new(ledger),
        max_body_bytes: settings.max_body_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = RequestBodyLimitLayer::new(state.max_body_bytes);
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/rsvp",
            get(forward_lookup)
                .post(forward_submission)
                .fallback(method_not_allowed),
        )
        .layer(body_limit)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn forward_lookup(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, RelayError> {
    let params: Vec<(String, String)> = query
        .as_deref()
        .map(|raw| url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let reply = state.relay.forward_lookup(params).await?;
    Ok(reply_response(reply))
}

async fn forward_submission(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, RelayError> {
    let reply = state.relay.forward_submission(&body).await?;
    Ok(reply_response(reply))
}

async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

fn reply_response(reply: RelayReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    match reply.body {
        ReplyBody::Json { raw, .. } => {
            (status, [(header::CONTENT_TYPE, "application/json")], raw).into_response()
        }
        ReplyBody::Text(text) => {
            (status, [(header::CONTENT_TYPE, "text/plain")], text).into_response()
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
