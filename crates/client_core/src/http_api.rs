use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{LookupQuery, RelayReply, SubmissionRequest};
use tracing::debug;
use url::Url;

use crate::{
    error::{ClientConfigError, TransportError},
    RsvpApi,
};

/// `RsvpApi` over HTTP against a running relay.
#[derive(Clone)]
pub struct HttpRsvpApi {
    http: Client,
    rsvp_url: Url,
}

impl HttpRsvpApi {
    pub fn new(relay_url: &str) -> Result<Self, ClientConfigError> {
        let relay_url = relay_url.trim();
        if relay_url.is_empty() {
            return Err(ClientConfigError::MissingRelayUrl);
        }

        let invalid = |source| ClientConfigError::InvalidRelayUrl {
            url: relay_url.to_string(),
            source,
        };
        let mut base = Url::parse(relay_url).map_err(invalid)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientConfigError::UnsupportedScheme {
                url: relay_url.to_string(),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rsvp_url = base.join("rsvp").map_err(invalid)?;

        Ok(Self {
            http: Client::new(),
            rsvp_url,
        })
    }

    pub fn rsvp_url(&self) -> &Url {
        &self.rsvp_url
    }

    pub fn lookup_url(&self, guest: &str) -> Url {
        let mut url = self.rsvp_url.clone();
        url.query_pairs_mut()
            .extend_pairs(LookupQuery::for_guest(guest).pairs());
        url
    }
}

#[async_trait]
impl RsvpApi for HttpRsvpApi {
    async fn lookup(&self, guest: &str) -> Result<RelayReply, TransportError> {
        let res = self.http.get(self.lookup_url(guest)).send().await?;
        read_reply(res).await
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<RelayReply, TransportError> {
        let res = self
            .http
            .post(self.rsvp_url.clone())
            .json(request)
            .send()
            .await?;
        read_reply(res).await
    }
}

async fn read_reply(res: reqwest::Response) -> Result<RelayReply, TransportError> {
    let status = res.status().as_u16();
    let text = res.text().await?;
    debug!(status, "relay replied");
    Ok(RelayReply::from_text(status, text))
}

#[cfg(test)]
#[path = "tests/http_api_tests.rs"]
mod tests;
