// src/scoring/mod.rs

pub mod merge;

pub use merge::{merge_verdicts, MergedScore};
