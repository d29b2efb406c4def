// src/aggregator.rs

use crate::cache::verdict_cache::current_millis;
use crate::cache::VerdictCache;
use crate::config::AggregatorConfig;
use crate::normalize::normalize_subject;
use crate::patterns::classify;
use crate::providers::{
    GeminiProvider, OpenAiProvider, PhishTankProvider, ProviderError, ReputationProvider,
    SafeBrowsingProvider, UrlScanProvider, VirusTotalProvider,
};
use crate::scoring::merge_verdicts;
use crate::types::{AggregateVerdict, Label, Verdict};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Orchestrates provider adapters, the verdict cache, and the local pattern
/// classifier. `evaluate` never fails: the worst case is the local verdict.
pub struct Aggregator {
    providers: Vec<Arc<dyn ReputationProvider>>,
    config: AggregatorConfig,
    cache: Mutex<VerdictCache>,
}

impl Aggregator {
    /// Build the aggregator with the real adapters for every active provider.
    /// Providers whose key is missing or a placeholder are never constructed.
    pub fn new(config: AggregatorConfig) -> Self {
        // A per-call timeout beyond the overall deadline would never fire.
        let timeout = Duration::from_millis(
            config.provider_timeout_ms.min(config.overall_deadline_ms),
        );

        let mut providers: Vec<Arc<dyn ReputationProvider>> = Vec::new();
        if config.phish_tank.is_active() {
            providers.push(Arc::new(PhishTankProvider::new(&config.phish_tank, timeout)));
        }
        if config.safe_browsing.is_active() {
            providers.push(Arc::new(SafeBrowsingProvider::new(&config.safe_browsing, timeout)));
        }
        if config.virus_total.is_active() {
            providers.push(Arc::new(VirusTotalProvider::new(&config.virus_total, timeout)));
        }
        if config.url_scan.is_active() {
            providers.push(Arc::new(UrlScanProvider::new(&config.url_scan, timeout)));
        }
        if config.gemini.is_active() {
            providers.push(Arc::new(GeminiProvider::new(&config.gemini, timeout)));
        }
        if config.openai.is_active() {
            providers.push(Arc::new(OpenAiProvider::new(&config.openai, timeout)));
        }

        Self::with_providers(providers, config)
    }

    /// Inject an arbitrary provider set; the seam tests use to fake providers.
    pub fn with_providers(
        providers: Vec<Arc<dyn ReputationProvider>>,
        config: AggregatorConfig,
    ) -> Self {
        let cache = Mutex::new(VerdictCache::new(config.cache_capacity));
        Self {
            providers,
            config,
            cache,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Evaluate a URL or text subject.
    ///
    /// Cache hit short-circuits all provider calls. On a miss every provider
    /// is queried concurrently under the overall deadline; failed or late
    /// providers are dropped from the merge. With zero provider verdicts the
    /// local classifier decides alone.
    pub async fn evaluate(&self, subject: &str) -> AggregateVerdict {
        let key = normalize_subject(subject);

        if self.config.cache_results {
            if let Some(hit) = self.cache.lock().await.get(&key) {
                debug!(subject = %key, "cache hit");
                return hit;
            }
        }

        let provider_verdicts = self.fan_out(&key).await;
        let result = self.merge(&key, provider_verdicts);

        if self.config.cache_results {
            self.cache
                .lock()
                .await
                .put(key, result.clone(), self.config.cache_duration_ms);
        }

        result
    }

    /// Drop every cached verdict.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    async fn fan_out(&self, subject: &str) -> Vec<(Verdict, f64)> {
        let per_call = Duration::from_millis(
            self.config.provider_timeout_ms.min(self.config.overall_deadline_ms),
        );

        let mut in_flight = FuturesUnordered::new();
        for provider in &self.providers {
            let provider = provider.clone();
            let subject = subject.to_string();
            in_flight.push(tokio::spawn(async move {
                let name = provider.provider_name().to_string();
                let weight = provider.trust_weight();
                match tokio::time::timeout(per_call, provider.lookup(&subject)).await {
                    Ok(Ok(verdict)) => Ok((verdict, weight)),
                    Ok(Err(err)) => Err((name, err)),
                    Err(_) => Err((name, ProviderError::Timeout)),
                }
            }));
        }

        let deadline = tokio::time::sleep(Duration::from_millis(self.config.overall_deadline_ms));
        tokio::pin!(deadline);

        let mut collected = Vec::new();
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    // Outstanding tasks are abandoned; whatever they
                    // eventually produce is discarded.
                    warn!(
                        pending = in_flight.len(),
                        "overall deadline elapsed, aggregating partial results"
                    );
                    break;
                }
                next = in_flight.next() => {
                    match next {
                        None => break,
                        Some(Ok(Ok((verdict, weight)))) => collected.push((verdict, weight)),
                        Some(Ok(Err((name, err)))) => log_provider_failure(&name, &err),
                        Some(Err(join_err)) => warn!(error = %join_err, "provider task panicked"),
                    }
                }
            }
        }

        collected
    }

    fn merge(&self, key: &str, provider_verdicts: Vec<(Verdict, f64)>) -> AggregateVerdict {
        let evaluated_at_ms = current_millis();

        if provider_verdicts.is_empty() {
            let local = classify(key);
            return AggregateVerdict {
                subject: key.to_string(),
                label: local.label,
                confidence: local.confidence,
                verdicts: vec![local],
                evaluated_at_ms,
            };
        }

        let mut weighted = provider_verdicts;
        if self.config.use_local_patterns {
            weighted.push((classify(key), 1.0));
        }

        let merged = merge_verdicts(&weighted);

        // Providers that only answered "unknown" decide nothing; rather than
        // hand the caller an empty verdict, let the classifier rule.
        if merged.label == Label::Unknown {
            let local = classify(key);
            let mut verdicts: Vec<Verdict> = weighted.into_iter().map(|(v, _)| v).collect();
            let (label, confidence) = (local.label, local.confidence);
            if !verdicts.iter().any(|v| v.source == local.source) {
                verdicts.push(local);
            }
            return AggregateVerdict {
                subject: key.to_string(),
                label,
                confidence,
                verdicts,
                evaluated_at_ms,
            };
        }

        AggregateVerdict {
            subject: key.to_string(),
            label: merged.label,
            confidence: merged.confidence,
            verdicts: weighted.into_iter().map(|(v, _)| v).collect(),
            evaluated_at_ms,
        }
    }
}

fn log_provider_failure(name: &str, err: &ProviderError) {
    match err {
        // Expected when a provider is configured off.
        ProviderError::Unavailable => debug!(provider = %name, "provider unavailable"),
        ProviderError::Timeout => warn!(provider = %name, "provider timed out"),
        ProviderError::Http { status, body } => {
            warn!(provider = %name, status, body = %body, "provider returned an error response")
        }
        ProviderError::Parse(msg) => {
            warn!(provider = %name, error = %msg, "provider response failed to parse")
        }
        ProviderError::Network(msg) => {
            warn!(provider = %name, error = %msg, "provider network error")
        }
    }
}
