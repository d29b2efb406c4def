// src/config.rs

use serde::Deserialize;
use std::env;

/// Per-provider configuration. A provider whose key is empty or still the
/// placeholder string is never invoked, regardless of `enabled`.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderSettings {
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Trust weight used by the merge step.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl ProviderSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: None,
            weight: 1.0,
        }
    }

    pub fn with_key(api_key: &str, weight: f64) -> Self {
        Self {
            enabled: true,
            api_key: api_key.to_string(),
            model: None,
            weight,
        }
    }

    /// Runtime enablement: `enabled` plus a usable key.
    pub fn is_active(&self) -> bool {
        self.enabled && !is_placeholder_key(&self.api_key)
    }
}

/// Keys left at their template value must resolve to disabled, never be sent
/// to a provider.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.contains("YOUR_") || key.ends_with("_HERE")
}

#[derive(Clone, Debug, Deserialize)]
pub struct AggregatorConfig {
    pub safe_browsing: ProviderSettings,
    pub virus_total: ProviderSettings,
    pub phish_tank: ProviderSettings,
    pub url_scan: ProviderSettings,
    pub gemini: ProviderSettings,
    pub openai: ProviderSettings,

    /// Include the local pattern classifier as an extra vote alongside
    /// provider verdicts. The classifier always serves as the fallback when
    /// no provider verdict could be obtained.
    #[serde(default = "default_true")]
    pub use_local_patterns: bool,

    #[serde(default = "default_true")]
    pub cache_results: bool,
    /// TTL for cached verdicts.
    #[serde(default = "default_cache_duration_ms")]
    pub cache_duration_ms: u64,
    /// LRU capacity bound for the verdict cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Per-provider call timeout.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    /// Deadline for the whole fan-out; late providers are dropped.
    #[serde(default = "default_overall_deadline_ms")]
    pub overall_deadline_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_cache_duration_ms() -> u64 {
    3_600_000 // 1 hour
}

fn default_cache_capacity() -> usize {
    512
}

fn default_provider_timeout_ms() -> u64 {
    5_000
}

fn default_overall_deadline_ms() -> u64 {
    8_000
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            safe_browsing: ProviderSettings::disabled(),
            virus_total: ProviderSettings::disabled(),
            phish_tank: ProviderSettings::disabled(),
            url_scan: ProviderSettings::disabled(),
            gemini: ProviderSettings::disabled(),
            openai: ProviderSettings::disabled(),
            use_local_patterns: true,
            cache_results: true,
            cache_duration_ms: default_cache_duration_ms(),
            cache_capacity: default_cache_capacity(),
            provider_timeout_ms: default_provider_timeout_ms(),
            overall_deadline_ms: default_overall_deadline_ms(),
        }
    }
}

impl AggregatorConfig {
    /// Build from environment variables. A provider is enabled by setting its
    /// key; placeholder keys still resolve to disabled.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Database-style reputation sources carry more trust than the
        // generative classifiers.
        config.safe_browsing = provider_from_env("SAFE_BROWSING_API_KEY", 2.0);
        config.virus_total = provider_from_env("VIRUSTOTAL_API_KEY", 2.0);
        config.phish_tank = provider_from_env("PHISHTANK_API_KEY", 1.5);
        config.url_scan = provider_from_env("URLSCAN_API_KEY", 1.0);

        config.gemini = provider_from_env("GEMINI_API_KEY", 1.0);
        config.gemini.model =
            Some(env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string()));

        config.openai = provider_from_env("OPENAI_API_KEY", 1.0);
        config.openai.model =
            Some(env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()));

        if let Ok(v) = env::var("CACHE_DURATION_MS") {
            if let Ok(ms) = v.parse() {
                config.cache_duration_ms = ms;
            }
        }
        if let Ok(v) = env::var("CACHE_CAPACITY") {
            if let Ok(n) = v.parse() {
                config.cache_capacity = n;
            }
        }

        config
    }
}

fn provider_from_env(var: &str, weight: f64) -> ProviderSettings {
    match env::var(var) {
        Ok(key) => ProviderSettings {
            enabled: !is_placeholder_key(&key),
            api_key: key,
            model: None,
            weight,
        },
        Err(_) => ProviderSettings::disabled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_key_detection() {
        assert!(is_placeholder_key(""));
        assert!(is_placeholder_key("   "));
        assert!(is_placeholder_key("YOUR_GOOGLE_SAFE_BROWSING_API_KEY_HERE"));
        assert!(is_placeholder_key("YOUR_URLSCAN_API_KEY_HERE"));
        assert!(!is_placeholder_key("a5da0d26010e4283"));
    }

    #[test]
    fn test_enabled_with_placeholder_key_is_inactive() {
        let settings = ProviderSettings {
            enabled: true,
            api_key: "YOUR_GEMINI_API_KEY_HERE".to_string(),
            model: Some("gemini-pro".to_string()),
            weight: 1.0,
        };
        assert!(!settings.is_active());
    }

    #[test]
    fn test_enabled_with_real_key_is_active() {
        let settings = ProviderSettings::with_key("real-key-123", 2.0);
        assert!(settings.is_active());
    }

    #[test]
    fn test_defaults_match_expected_policy() {
        let config = AggregatorConfig::default();
        assert!(config.use_local_patterns);
        assert!(config.cache_results);
        assert_eq!(config.cache_duration_ms, 3_600_000);
        assert_eq!(config.provider_timeout_ms, 5_000);
        assert_eq!(config.overall_deadline_ms, 8_000);
    }
}
