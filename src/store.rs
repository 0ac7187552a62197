use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which matching strategy indexes a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Exact trigger, word boundaries required on both sides
    Word,
    /// Exact trigger, no boundary check (may match inside other words)
    Phrase,
    /// Regex trigger with `$1`..`$9` capture substitution
    Regex,
    /// Approximate trigger via delete-distance lookup
    Fuzzy,
}

/// A single trigger→replacement rule
///
/// Serialized with camelCase keys so the persisted file matches what the
/// configuration UI sends over the transport (`matchType`, not `match_type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRule {
    /// Stable opaque identifier assigned by the rule editor
    pub id: String,
    /// Pattern text the rule searches for
    pub trigger: String,
    /// Replacement template (literal, except `$1`..`$9` for regex rules)
    pub replacement: String,
    /// Matching strategy for this rule
    pub match_type: MatchType,
    /// Disabled rules are persisted but never indexed
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Errors from dictionary persistence
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or parse the persisted dictionary
    #[error("failed to load dictionary from {path}: {source}")]
    Load {
        /// Path to the dictionary file
        path: String,
        /// Underlying error
        source: anyhow::Error,
    },

    /// Failed to write the dictionary to disk
    #[error("failed to persist dictionary to {path}: {source}")]
    Persist {
        /// Path to the dictionary file
        path: String,
        /// Underlying error
        source: anyhow::Error,
    },
}

/// Holds the ordered rule set and owns its persistence
///
/// The store is the only durable state of the engine; the matcher structures
/// are derived caches rebuilt from it. Rules keep the order they were given
/// in: index-build code relies on that order for first-rule-wins resolution.
#[derive(Debug)]
pub struct DictionaryStore {
    rules: Vec<ReplacementRule>,
    enabled: bool,
    path: PathBuf,
}

impl DictionaryStore {
    /// Creates an empty, enabled store persisting to `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            rules: Vec::new(),
            enabled: true,
            path,
        }
    }

    /// Default dictionary path: `~/.whisper-dictionary/dictionary.json`
    ///
    /// # Errors
    /// Returns error if HOME is not set
    pub fn default_path() -> anyhow::Result<PathBuf> {
        use anyhow::Context;
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home)
            .join(".whisper-dictionary")
            .join("dictionary.json"))
    }

    /// Loads persisted rules, replacing the in-memory set
    ///
    /// A missing file is the empty set. An unreadable or unparsable file
    /// leaves the store empty and returns the error so the caller can report
    /// "dictionary unavailable" — it must never escalate to a crash.
    ///
    /// # Errors
    /// Returns [`StoreError::Load`] on read or parse failure
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.rules.clear();

        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no dictionary file, starting empty");
            return Ok(());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| StoreError::Load {
            path: self.path.display().to_string(),
            source: e.into(),
        })?;

        let rules: Vec<ReplacementRule> =
            serde_json::from_str(&contents).map_err(|e| StoreError::Load {
                path: self.path.display().to_string(),
                source: e.into(),
            })?;

        tracing::info!(count = rules.len(), "dictionary loaded");
        self.rules = rules;
        Ok(())
    }

    /// Replaces the full rule set and persists it
    ///
    /// The in-memory set is updated even when the write fails, so the engine
    /// keeps serving the new rules; the error only reports that they did not
    /// reach disk.
    ///
    /// # Errors
    /// Returns [`StoreError::Persist`] on write failure
    pub fn replace_all(&mut self, rules: Vec<ReplacementRule>) -> Result<(), StoreError> {
        self.rules = rules;
        self.save()
    }

    /// Empties the rule set and deletes the persisted file
    ///
    /// # Errors
    /// Returns [`StoreError::Persist`] if the file exists but cannot be removed
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.rules.clear();
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| StoreError::Persist {
                path: self.path.display().to_string(),
                source: e.into(),
            })?;
        }
        tracing::info!("dictionary cleared");
        Ok(())
    }

    /// Whether replacement is globally enabled
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggles global replacement
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// All rules in insertion order
    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// Enabled rules in insertion order
    pub fn enabled_rules(&self) -> impl Iterator<Item = &ReplacementRule> + '_ {
        self.rules.iter().filter(|r| r.enabled)
    }

    /// Atomic write: temp file, sync, rename
    ///
    /// A crash between any two steps leaves either the old file or no file at
    /// the real path, never a truncated one.
    fn save(&self) -> Result<(), StoreError> {
        let persist_err = |source: anyhow::Error| StoreError::Persist {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| persist_err(e.into()))?;
        }

        let contents =
            serde_json::to_string_pretty(&self.rules).map_err(|e| persist_err(e.into()))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).map_err(|e| persist_err(e.into()))?;
            file.write_all(contents.as_bytes())
                .map_err(|e| persist_err(e.into()))?;
            file.sync_all().map_err(|e| persist_err(e.into()))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            persist_err(e.into())
        })?;

        tracing::debug!(
            count = self.rules.len(),
            path = %self.path.display(),
            "dictionary persisted"
        );
        Ok(())
    }

    /// Path of the persisted dictionary file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
