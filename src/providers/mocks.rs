use super::{ProviderError, ReputationProvider};
use crate::types::{Label, Verdict};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub enum MockFailure {
    Unavailable,
    Timeout,
    Http,
}

/// Configurable in-process provider for tests: fixed verdict or failure,
/// optional response delay, and a call counter.
pub struct MockProvider {
    name: String,
    weight: f64,
    verdict: Option<(Label, f64)>,
    failure: Option<MockFailure>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(name: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            weight,
            verdict: None,
            failure: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_verdict(mut self, label: Label, confidence: f64) -> Self {
        self.verdict = Some((label, confidence));
        self
    }

    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the call counter, usable after the provider moves into an
    /// aggregator.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ReputationProvider for MockProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn trust_weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(&self, _subject: &str) -> Result<Verdict, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.failure {
            return Err(match failure {
                MockFailure::Unavailable => ProviderError::Unavailable,
                MockFailure::Timeout => ProviderError::Timeout,
                MockFailure::Http => ProviderError::Http {
                    status: 500,
                    body: "mock failure".to_string(),
                },
            });
        }

        let (label, confidence) = self.verdict.unwrap_or((Label::Unknown, 0.0));
        Ok(Verdict {
            label,
            confidence,
            source: self.name.clone(),
            raw: None,
        })
    }
}
