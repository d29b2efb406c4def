// src/cache/mod.rs

pub mod verdict_cache;

pub use verdict_cache::VerdictCache;
