//! Whisper Dictionary - dictionary-replacement engine for dictated text
//!
//! Post-processes finalized speech-to-text output through three sequential
//! matching stages (trie, regex, fuzzy) driven by user-configured
//! trigger→replacement rules.

/// Configuration management
pub mod config;
/// Pipeline orchestrator and engine API
pub mod engine;
/// Matching strategies and overlap resolution
pub mod matcher;
/// Rule storage and JSON persistence
pub mod store;
/// Telemetry and logging
pub mod telemetry;

pub use engine::{DictionaryEngine, DictionaryProcessingResult, DictionaryProcessor};
pub use matcher::fuzzy::FuzzyConfig;
pub use matcher::ReplacementCount;
pub use store::{MatchType, ReplacementRule};
