// src/release/http.rs - Release listing over HTTP
//
// Expects a JSON listing of active releases:
//   {"results": [{"version": "39"}, {"version": "40"}, {"version": "Rawhide"}]}
// The current release is the highest numeric version, prefixed with "f".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::ReleaseProvider;
use crate::infra::errors::{KarmaError, KarmaResult};
use crate::ledger::ReleaseId;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ReleaseListing {
    results: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    version: String,
}

pub struct HttpReleaseProvider {
    client: Client,
    url: String,
}

impl HttpReleaseProvider {
    pub fn new(url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, url }
    }
}

#[async_trait]
impl ReleaseProvider for HttpReleaseProvider {
    async fn current_release(&self) -> KarmaResult<ReleaseId> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| KarmaError::release(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(KarmaError::release(format!(
                "{} returned {}",
                self.url,
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| KarmaError::release(e.to_string()))?;
        parse_listing(&body)
    }
}

/// Pick the newest numbered release out of a listing body.
pub fn parse_listing(body: &str) -> KarmaResult<ReleaseId> {
    let listing: ReleaseListing = serde_json::from_str(body)?;
    listing
        .results
        .iter()
        .filter(|r| r.version != "Rawhide")
        .filter_map(|r| r.version.trim().parse::<u32>().ok())
        .max()
        .map(|v| ReleaseId::new(format!("f{v}")))
        .ok_or_else(|| KarmaError::release("no numbered release in listing"))
}
