//! Matching strategies over one utterance of text
//!
//! Three structures are compiled from the rule set: a trie over word/phrase
//! triggers, a cache of case-insensitive regexes, and a delete-distance index
//! over fuzzy triggers. Each is rebuilt from scratch on every rule mutation
//! and queried read-only on the hot path.

/// Delete-distance index for approximate trigger matching
pub mod fuzzy;
/// Compiled regex cache with capture substitution
pub mod regex;
/// Word-boundary validation and overlap resolution for trie candidates
pub mod resolver;
/// Arena trie over word/phrase triggers
pub mod trie;

use serde::Serialize;
use std::collections::HashMap;

/// One rule's contribution to a processing result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementCount {
    /// The rule's trigger text
    pub trigger: String,
    /// The rule's replacement text
    pub replacement: String,
    /// How many times the rule fired
    pub count: usize,
}

/// Accumulates per-rule replacement counts across pipeline stages
///
/// Entries keep first-application order; repeated applications of the same
/// rule bump its existing entry.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    counts: Vec<ReplacementCount>,
    by_rule: HashMap<String, usize>,
}

impl Tally {
    pub(crate) fn record(&mut self, rule_id: &str, trigger: &str, replacement: &str) {
        if let Some(&pos) = self.by_rule.get(rule_id) {
            self.counts[pos].count += 1;
        } else {
            self.by_rule.insert(rule_id.to_owned(), self.counts.len());
            self.counts.push(ReplacementCount {
                trigger: trigger.to_owned(),
                replacement: replacement.to_owned(),
                count: 1,
            });
        }
    }

    pub(crate) fn into_counts(self) -> Vec<ReplacementCount> {
        self.counts
    }
}
