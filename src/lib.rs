// src/lib.rs

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod normalize;
pub mod patterns;
pub mod providers;
pub mod scoring;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use aggregator::Aggregator;
pub use cache::VerdictCache;
pub use config::{AggregatorConfig, ProviderSettings};
pub use providers::{ProviderError, ReputationProvider};
pub use scoring::{merge_verdicts, MergedScore};
pub use types::{AggregateVerdict, Label, Verdict};
