use super::{ProviderError, ReputationProvider};
use crate::config::ProviderSettings;
use crate::types::{Label, Verdict};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const ENDPOINT: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";

pub const SOURCE: &str = "safe_browsing";

/// Google Safe Browsing v4 `threatMatches:find` lookup.
pub struct SafeBrowsingProvider {
    api_key: String,
    weight: f64,
    client: reqwest::Client,
}

impl SafeBrowsingProvider {
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
struct ThreatMatchesResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

#[derive(Debug, Deserialize)]
struct ThreatMatch {
    #[serde(rename = "threatType")]
    threat_type: Option<String>,
}

fn verdict_from_response(response: ThreatMatchesResponse, raw: serde_json::Value) -> Verdict {
    if response.matches.is_empty() {
        return Verdict {
            label: Label::Benign,
            confidence: 0.6,
            source: SOURCE.to_string(),
            raw: Some(raw),
        };
    }

    // Phishing lists are near-authoritative; direct social engineering hits
    // slightly more so.
    let phishing_hit = response
        .matches
        .iter()
        .any(|m| m.threat_type.as_deref() == Some("SOCIAL_ENGINEERING"));

    Verdict {
        label: Label::Malicious,
        confidence: if phishing_hit { 0.95 } else { 0.9 },
        source: SOURCE.to_string(),
        raw: Some(raw),
    }
}

#[async_trait]
impl ReputationProvider for SafeBrowsingProvider {
    fn provider_name(&self) -> &str {
        SOURCE
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError> {
        let body = json!({
            "client": {
                "clientId": "scam-reputation-aggregator",
                "clientVersion": "0.1.0",
            },
            "threatInfo": {
                "threatTypes": ["MALWARE", "SOCIAL_ENGINEERING", "UNWANTED_SOFTWARE"],
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": subject }],
            },
        });

        let response = self
            .client
            .post(format!("{}?key={}", ENDPOINT, self.api_key))
            .json(&body)
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

        // Schema drift tolerance: an unrecognizable payload is an unknown
        // verdict, not a failure.
        match serde_json::from_value::<ThreatMatchesResponse>(raw.clone()) {
            Ok(parsed) => Ok(verdict_from_response(parsed, raw)),
            Err(_) => Ok(Verdict {
                raw: Some(raw),
                ..Verdict::unknown(SOURCE)
            }),
        }
    }
}
