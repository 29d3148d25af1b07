use reqwest::{header, Client};
use serde_json::Value;
use shared::protocol::RelayReply;
use tracing::{error, field, info, Span};
use url::Url;
use uuid::Uuid;

use crate::{config::LedgerConfig, error::RelayError};

/// Stateless bridge to the ledger service. Cloning shares the connection pool.
#[derive(Clone)]
pub struct LedgerRelay {
    http: Client,
    ledger_url: Url,
}

impl LedgerRelay {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: LedgerConfig, http: Client) -> Self {
        Self {
            http,
            ledger_url: config.url,
        }
    }

    /// Ledger read URL carrying every inbound pair. An inbound key replaces
    /// the same key already on the ledger URL; for repeated inbound keys the
    /// last value wins.
    pub fn lookup_url(&self, params: &[(String, String)]) -> Url {
        let mut incoming: Vec<(&str, &str)> = Vec::with_capacity(params.len());
        for (key, value) in params {
            match incoming
                .iter_mut()
                .find(|(existing, _)| *existing == key.as_str())
            {
                Some(slot) => slot.1 = value.as_str(),
                None => incoming.push((key.as_str(), value.as_str())),
            }
        }

        let kept: Vec<(String, String)> = self
            .ledger_url
            .query_pairs()
            .filter(|(key, _)| {
                !incoming
                    .iter()
                    .any(|(incoming_key, _)| *incoming_key == &**key)
            })
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.ledger_url.clone();
        url.set_query(None);
        if !kept.is_empty() || !incoming.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .extend_pairs(incoming);
        }
        url
    }

    #[tracing::instrument(
        name = "forward_lookup",
        skip_all,
        fields(
            request_id = %Uuid::new_v4(),
            mode = field::Empty,
            upstream_status = field::Empty
        )
    )]
    pub async fn forward_lookup(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<RelayReply, RelayError> {
        if let Some(mode) = lookup_mode(&params) {
            Span::current().record("mode", mode);
        }
        let url = self.lookup_url(&params);
        let res = self.http.get(url).send().await.map_err(|err| {
            error!(error = %err, "ledger lookup request failed");
            RelayError::Unreachable(err)
        })?;
        read_reply(res).await
    }

    #[tracing::instrument(
        name = "forward_submission",
        skip_all,
        fields(
            request_id = %Uuid::new_v4(),
            mode = field::Empty,
            upstream_status = field::Empty
        )
    )]
    pub async fn forward_submission(&self, body: &[u8]) -> Result<RelayReply, RelayError> {
        let payload: Value = serde_json::from_slice(body).map_err(RelayError::InvalidPayload)?;
        if let Some(mode) = submission_mode(&payload) {
            Span::current().record("mode", mode);
        }

        let res = self
            .http
            .post(self.ledger_url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "ledger submission request failed");
                RelayError::Unreachable(err)
            })?;
        read_reply(res).await
    }
}

/// Last `mode` pair of a lookup query, matching what the ledger will see.
fn lookup_mode(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .rev()
        .find(|(key, _)| key == "mode")
        .map(|(_, value)| value.as_str())
}

fn submission_mode(payload: &Value) -> Option<&str> {
    payload.get("mode").and_then(Value::as_str)
}

async fn read_reply(res: reqwest::Response) -> Result<RelayReply, RelayError> {
    let status = res.status().as_u16();
    Span::current().record("upstream_status", status);

    let text = res.text().await.map_err(|err| {
        error!(error = %err, "failed to read ledger reply body");
        RelayError::UnreadableBody(err)
    })?;

    let reply = RelayReply::from_text(status, text);
    info!(
        structured = reply.as_json().is_some(),
        "ledger reply forwarded"
    );
    Ok(reply)
}

#[cfg(test)]
#[path = "tests/relay_tests.rs"]
mod tests;
