// src/types.rs

use serde::{Deserialize, Serialize};

/// Classification assigned to a subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Benign,
    Suspicious,
    Malicious,
    Unknown,
}

impl Label {
    /// Conservative ordering: when weighted votes tie, the riskier label wins.
    pub fn risk_rank(&self) -> u8 {
        match self {
            Label::Malicious => 3,
            Label::Suspicious => 2,
            Label::Benign => 1,
            Label::Unknown => 0,
        }
    }
}

/// A single normalized classification result from one provider or the
/// local classifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// In [0, 1].
    pub confidence: f64,
    /// Provider identifier, or "local" for the pattern classifier.
    pub source: String,
    /// Raw provider payload kept for diagnosis.
    pub raw: Option<serde_json::Value>,
}

impl Verdict {
    pub fn unknown(source: &str) -> Self {
        Self {
            label: Label::Unknown,
            confidence: 0.0,
            source: source.to_string(),
            raw: None,
        }
    }
}

/// Final merged result returned to callers. Built once per lookup, never
/// mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateVerdict {
    /// Normalized form of the evaluated subject (also the cache key).
    pub subject: String,
    pub label: Label,
    pub confidence: f64,
    /// Contributing verdicts in the order they were merged.
    pub verdicts: Vec<Verdict>,
    pub evaluated_at_ms: u64,
}
