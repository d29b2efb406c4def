use super::{ProviderError, ReputationProvider};
use crate::config::ProviderSettings;
use crate::types::{Label, Verdict};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const SOURCE: &str = "gemini";

const DEFAULT_MODEL: &str = "gemini-pro";

/// Google Gemini content classification. The model is prompted for a JSON
/// verdict; anything that does not come back as parseable JSON is an unknown.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    weight: f64,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            weight: settings.weight,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

/// Verdict schema both generative providers are prompted to produce.
#[derive(Debug, Deserialize)]
pub struct AiAnalysis {
    #[serde(rename = "isPhishing", default)]
    pub is_phishing: bool,
    /// 0-100 as prompted.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub threats: Vec<String>,
}

pub fn verdict_from_analysis(analysis: &AiAnalysis, source: &str, raw: serde_json::Value) -> Verdict {
    let confidence = (analysis.confidence / 100.0).clamp(0.0, 1.0);

    let label = if analysis.is_phishing && analysis.confidence >= 70.0 {
        Label::Malicious
    } else if analysis.is_phishing {
        Label::Suspicious
    } else {
        Label::Benign
    };

    Verdict {
        label,
        confidence,
        source: source.to_string(),
        raw: Some(raw),
    }
}

/// Models wrap their JSON in prose more often than not; take the outermost
/// braced span.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

pub fn classification_prompt(subject: &str) -> String {
    format!(
        "Analyze this subject for phishing or scam indicators:\n\
         Subject: {}\n\n\
         Look for urgency language and pressure tactics, requests for \
         sensitive information, suspicious URLs or brand impersonation, \
         threats about account suspension, and promises of prizes or money.\n\n\
         Respond in JSON format:\n\
         {{\"isPhishing\": true/false, \"confidence\": 0-100, \
         \"threats\": [\"list of specific threats found\"]}}",
        subject.chars().take(2000).collect::<String>()
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ReputationProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        SOURCE
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError> {
        let endpoint = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": classification_prompt(subject) }] }],
        });

        let response = self
            .client
            .post(&endpoint)
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

        let parsed: GenerateContentResponse = match serde_json::from_value(raw.clone()) {
            Ok(p) => p,
            Err(_) => {
                return Ok(Verdict {
                    raw: Some(raw),
                    ..Verdict::unknown(SOURCE)
                })
            }
        };

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or("");

        let analysis = extract_json_object(text)
            .and_then(|blob| serde_json::from_str::<AiAnalysis>(blob).ok());

        match analysis {
            Some(analysis) => Ok(verdict_from_analysis(&analysis, SOURCE, raw)),
            None => Ok(Verdict {
                raw: Some(raw),
                ..Verdict::unknown(SOURCE)
            }),
        }
    }
}
