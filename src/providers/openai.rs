use super::gemini::{classification_prompt, verdict_from_analysis, AiAnalysis};
use super::{ProviderError, ReputationProvider};
use crate::config::ProviderSettings;
use crate::types::Verdict;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

pub const SOURCE: &str = "openai";

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI chat-completion classification. `response_format: json_object`
/// makes the reply directly parseable, no prose extraction needed.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    weight: f64,
    client: reqwest::Client,
}

impl OpenAiProvider {
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

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ReputationProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        SOURCE
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": classification_prompt(subject),
            }],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
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

        let content = serde_json::from_value::<ChatCompletionResponse>(raw.clone())
            .ok()
            .and_then(|r| r.choices.into_iter().next())
            .map(|c| c.message.content);

        let analysis = content.and_then(|c| serde_json::from_str::<AiAnalysis>(&c).ok());

        match analysis {
            Some(analysis) => Ok(verdict_from_analysis(&analysis, SOURCE, raw)),
            None => Ok(Verdict {
                raw: Some(raw),
                ..Verdict::unknown(SOURCE)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    #[test]
    fn test_completion_content_parses_to_verdict() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": "{\"isPhishing\": true, \"confidence\": 92, \"threats\": [\"brand impersonation\"]}"
                }
            }]
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(raw.clone()).unwrap();
        let content = &parsed.choices[0].message.content;
        let analysis: AiAnalysis = serde_json::from_str(content).unwrap();
        let verdict = verdict_from_analysis(&analysis, SOURCE, raw);

        assert_eq!(verdict.label, Label::Malicious);
        assert_eq!(verdict.source, "openai");
    }

    #[test]
    fn test_empty_choices_yields_no_analysis() {
        let raw = json!({ "choices": [] });
        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
