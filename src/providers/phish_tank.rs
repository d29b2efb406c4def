use super::{ProviderError, ReputationProvider};
use crate::config::ProviderSettings;
use crate::types::{Label, Verdict};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const ENDPOINT: &str = "https://checkurl.phishtank.com/checkurl/";

pub const SOURCE: &str = "phish_tank";

/// PhishTank checkurl lookup against the community phishing database.
pub struct PhishTankProvider {
    api_key: String,
    weight: f64,
    client: reqwest::Client,
}

impl PhishTankProvider {
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
struct CheckUrlResponse {
    results: CheckUrlResults,
}

#[derive(Debug, Default, Deserialize)]
struct CheckUrlResults {
    #[serde(default)]
    in_database: bool,
    /// Whether the community confirmed the report as a live phish.
    #[serde(default)]
    valid: bool,
}

fn verdict_from_results(results: &CheckUrlResults, raw: serde_json::Value) -> Verdict {
    let (label, confidence) = if results.in_database && results.valid {
        (Label::Malicious, 0.8)
    } else if results.in_database {
        // Reported but not verified.
        (Label::Suspicious, 0.4)
    } else {
        // Absence from the database is no signal either way.
        (Label::Unknown, 0.0)
    };

    Verdict {
        label,
        confidence,
        source: SOURCE.to_string(),
        raw: Some(raw),
    }
}

#[async_trait]
impl ReputationProvider for PhishTankProvider {
    fn provider_name(&self) -> &str {
        SOURCE
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError> {
        let form = [
            ("url", subject),
            ("format", "json"),
            ("app_key", self.api_key.as_str()),
        ];

        let response = self
            .client
            .post(ENDPOINT)
            .form(&form)
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

        match serde_json::from_value::<CheckUrlResponse>(raw.clone()) {
            Ok(parsed) => Ok(verdict_from_results(&parsed.results, raw)),
            Err(_) => Ok(Verdict {
                raw: Some(raw),
                ..Verdict::unknown(SOURCE)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verified_phish_is_malicious() {
        let results = CheckUrlResults {
            in_database: true,
            valid: true,
        };
        let verdict = verdict_from_results(&results, json!({}));

        assert_eq!(verdict.label, Label::Malicious);
        assert_eq!(verdict.confidence, 0.8);
    }

    #[test]
    fn test_unverified_report_is_suspicious() {
        let results = CheckUrlResults {
            in_database: true,
            valid: false,
        };
        let verdict = verdict_from_results(&results, json!({}));

        assert_eq!(verdict.label, Label::Suspicious);
    }

    #[test]
    fn test_unlisted_is_unknown() {
        let results = CheckUrlResults::default();
        let verdict = verdict_from_results(&results, json!({}));

        assert_eq!(verdict.label, Label::Unknown);
        assert_eq!(verdict.confidence, 0.0);
    }
}
