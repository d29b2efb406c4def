use super::{ProviderError, ReputationProvider};
use crate::config::ProviderSettings;
use crate::types::{Label, Verdict};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const ENDPOINT: &str = "https://urlscan.io/api/v1/search/";

pub const SOURCE: &str = "url_scan";

/// URLScan.io lookup via the search API. Existing scan results for the exact
/// page URL are queried in a single call; submitting a fresh scan and polling
/// for its result cannot complete inside the per-call deadline.
pub struct UrlScanProvider {
    api_key: String,
    weight: f64,
    client: reqwest::Client,
}

impl UrlScanProvider {
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            weight: settings.weight,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    verdicts: Option<Verdicts>,
}

#[derive(Debug, Default, Deserialize)]
struct Verdicts {
    #[serde(default)]
    overall: OverallVerdict,
}

#[derive(Debug, Default, Deserialize)]
struct OverallVerdict {
    #[serde(default)]
    malicious: bool,
    #[serde(default)]
    score: i64,
}

fn verdict_from_results(response: &SearchResponse, raw: serde_json::Value) -> Verdict {
    let overall = response
        .results
        .iter()
        .filter_map(|r| r.verdicts.as_ref())
        .map(|v| &v.overall)
        .max_by_key(|o| (o.malicious, o.score));

    let (label, confidence) = match overall {
        Some(o) if o.malicious => (Label::Malicious, 0.7),
        Some(o) if o.score > 50 => (Label::Suspicious, 0.5),
        Some(_) => (Label::Benign, 0.5),
        None => (Label::Unknown, 0.0),
    };

    Verdict {
        label,
        confidence,
        source: SOURCE.to_string(),
        raw: Some(raw),
    }
}

#[async_trait]
impl ReputationProvider for UrlScanProvider {
    fn provider_name(&self) -> &str {
        SOURCE
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError> {
        let query = format!("page.url:\"{}\"", subject);

        let response = self
            .client
            .get(ENDPOINT)
            .header("API-Key", &self.api_key)
            .query(&[("q", query.as_str()), ("size", "3")])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        match serde_json::from_value::<SearchResponse>(raw.clone()) {
            Ok(parsed) => Ok(verdict_from_results(&parsed, raw)),
            Err(_) => Ok(Verdict {
                raw: Some(raw),
                ..Verdict::unknown(SOURCE)
            }),
        }
    }
}
