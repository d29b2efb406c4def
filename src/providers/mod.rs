// src/providers/mod.rs

use crate::types::Verdict;
use async_trait::async_trait;

#[derive(Debug)]
pub enum ProviderError {
    /// Disabled or misconfigured; expected, never invoked as an error.
    Unavailable,
    /// Per-call deadline exceeded.
    Timeout,
    /// Non-2xx response; body kept for diagnosis.
    Http { status: u16, body: String },
    /// Response arrived but did not match the expected schema.
    Parse(String),
    Network(String),
}

impl ProviderError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// One external reputation source. Adapters are stateless beyond their
/// credentials and HTTP client: exactly one outbound call per lookup, no
/// internal retries (retry policy, if any, belongs to the aggregator).
#[async_trait]
pub trait ReputationProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Trust weight applied to this provider's verdicts by the merge step.
    fn trust_weight(&self) -> f64;

    async fn lookup(&self, subject: &str) -> Result<Verdict, ProviderError>;
}

// Module declarations
pub mod gemini;
pub mod mocks;
pub mod openai;
pub mod phish_tank;
pub mod safe_browsing;
pub mod url_scan;
pub mod virus_total;

// Re-export for construction and testing
pub use gemini::GeminiProvider;
pub use mocks::MockProvider;
pub use openai::OpenAiProvider;
pub use phish_tank::PhishTankProvider;
pub use safe_browsing::SafeBrowsingProvider;
pub use url_scan::UrlScanProvider;
pub use virus_total::VirusTotalProvider;
