use super::{ProviderError, ReputationProvider};
use crate::config::ProviderSettings;
use crate::types::{Label, Verdict};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;

pub const SOURCE: &str = "virus_total";

/// VirusTotal v3 URL report lookup. The URL id is the unpadded url-safe
/// base64 of the subject, per the v3 API contract.
pub struct VirusTotalProvider {
    api_key: String,
    weight: f64,
    client: reqwest::Client,
}

impl VirusTotalProvider {
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
struct UrlReport {
    data: ReportData,
}

#[derive(Debug, Deserialize)]
struct ReportData {
    attributes: ReportAttributes,
}

#[derive(Debug, Deserialize)]
struct ReportAttributes {
    #[serde(rename = "last_analysis_stats")]
    stats: AnalysisStats,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisStats {
    #[serde(default)]
    malicious: u32,
    #[serde(default)]
    suspicious: u32,
    #[serde(default)]
    harmless: u32,
}

fn verdict_from_stats(stats: &AnalysisStats, raw: serde_json::Value) -> Verdict {
    let (label, confidence) = if stats.malicious > 5 {
        // Broad engine consensus; confidence scales with detections.
        (Label::Malicious, (stats.malicious as f64 * 0.1).min(0.8))
    } else if stats.malicious > 0 {
        (Label::Suspicious, (stats.malicious as f64 * 0.1).max(0.3))
    } else if stats.suspicious > 0 {
        (Label::Suspicious, 0.3)
    } else if stats.harmless > 0 {
        (Label::Benign, 0.6)
    } else {
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
impl ReputationProvider for VirusTotalProvider {
    fn provider_name(&self) -> &str {
        SOURCE
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError> {
        let url_id = URL_SAFE_NO_PAD.encode(subject.as_bytes());

        let response = self
            .client
            .get(format!("https://www.virustotal.com/api/v3/urls/{}", url_id))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        // 404 means the URL has never been submitted, an unknown rather than
        // a provider failure.
        if response.status().as_u16() == 404 {
            return Ok(Verdict::unknown(SOURCE));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        match serde_json::from_value::<UrlReport>(raw.clone()) {
            Ok(report) => Ok(verdict_from_stats(&report.data.attributes.stats, raw)),
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
    fn test_broad_consensus_is_malicious() {
        let stats = AnalysisStats {
            malicious: 12,
            suspicious: 2,
            harmless: 50,
        };
        let verdict = verdict_from_stats(&stats, json!({}));

        assert_eq!(verdict.label, Label::Malicious);
        assert_eq!(verdict.confidence, 0.8);
    }

    #[test]
    fn test_few_detections_is_suspicious() {
        let stats = AnalysisStats {
            malicious: 2,
            suspicious: 0,
            harmless: 60,
        };
        let verdict = verdict_from_stats(&stats, json!({}));

        assert_eq!(verdict.label, Label::Suspicious);
        assert!(verdict.confidence >= 0.3);
    }

    #[test]
    fn test_clean_report_is_benign() {
        let stats = AnalysisStats {
            malicious: 0,
            suspicious: 0,
            harmless: 70,
        };
        let verdict = verdict_from_stats(&stats, json!({}));

        assert_eq!(verdict.label, Label::Benign);
    }

    #[test]
    fn test_empty_stats_is_unknown() {
        let stats = AnalysisStats::default();
        let verdict = verdict_from_stats(&stats, json!({}));

        assert_eq!(verdict.label, Label::Unknown);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_schema_drift_maps_to_unknown() {
        let raw = json!({ "data": { "unexpected": true } });
        let parsed = serde_json::from_value::<UrlReport>(raw.clone());
        assert!(parsed.is_err());
    }
}
