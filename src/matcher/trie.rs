use crate::store::{MatchType, ReplacementRule};
use std::collections::HashMap;

/// A word/phrase rule captured at index-build time
#[derive(Debug, Clone)]
pub struct TrieRule {
    pub(crate) id: String,
    pub(crate) trigger: String,
    pub(crate) replacement: String,
    pub(crate) match_type: MatchType,
}

/// Candidate substring match, byte offsets into the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieCandidate {
    /// Index into [`TrieMatcher::rules`]
    pub(crate) rule: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, usize>,
    /// Originating rule, set once (first rule wins on duplicate triggers)
    terminal: Option<usize>,
}

/// Multiway trie over enabled word/phrase triggers
///
/// Nodes live in one arena vector and reference children by index, so a
/// rebuild discards the old structure with a single drop. Triggers are
/// inserted lowercased; queries lowercase the haystack char by char, keeping
/// byte offsets of the original string exact even when lowercasing changes a
/// char's length.
#[derive(Debug)]
pub struct TrieMatcher {
    nodes: Vec<TrieNode>,
    rules: Vec<TrieRule>,
}

impl TrieMatcher {
    /// Builds the trie from enabled rules, indexing word/phrase triggers only
    pub fn build<'a>(rules: impl Iterator<Item = &'a ReplacementRule>) -> Self {
        let mut matcher = Self {
            nodes: vec![TrieNode::default()],
            rules: Vec::new(),
        };

        for rule in rules {
            if !matches!(rule.match_type, MatchType::Word | MatchType::Phrase) {
                continue;
            }
            if rule.trigger.is_empty() {
                tracing::warn!(rule_id = %rule.id, "skipping rule with empty trigger");
                continue;
            }
            matcher.insert(rule);
        }

        tracing::debug!(
            triggers = matcher.rules.len(),
            nodes = matcher.nodes.len(),
            "trie built"
        );
        matcher
    }

    fn insert(&mut self, rule: &ReplacementRule) {
        let mut node = 0;
        for ch in rule.trigger.to_lowercase().chars() {
            node = if let Some(&next) = self.nodes[node].children.get(&ch) {
                next
            } else {
                let next = self.nodes.len();
                self.nodes.push(TrieNode::default());
                self.nodes[node].children.insert(ch, next);
                next
            };
        }

        if self.nodes[node].terminal.is_some() {
            tracing::debug!(
                rule_id = %rule.id,
                trigger = %rule.trigger,
                "duplicate trigger ignored, first rule wins"
            );
            return;
        }

        self.nodes[node].terminal = Some(self.rules.len());
        self.rules.push(TrieRule {
            id: rule.id.clone(),
            trigger: rule.trigger.clone(),
            replacement: rule.replacement.clone(),
            match_type: rule.match_type,
        });
    }

    /// Scans the text, yielding every trigger occurrence at every offset
    ///
    /// Overlapping and nested candidates are all reported; the resolver
    /// decides which survive. Work is bounded by input length × longest
    /// trigger, since each walk stops at the first missing edge.
    pub fn find_candidates(&self, text: &str) -> Vec<TrieCandidate> {
        if self.rules.is_empty() {
            return Vec::new();
        }

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut candidates = Vec::new();

        for i in 0..chars.len() {
            let mut node = 0;
            'walk: for &(pos, ch) in &chars[i..] {
                // A char may lowercase to more than one char (e.g. İ); each
                // produced char walks one trie edge.
                for lc in ch.to_lowercase() {
                    match self.nodes[node].children.get(&lc) {
                        Some(&next) => node = next,
                        None => break 'walk,
                    }
                }
                if let Some(rule) = self.nodes[node].terminal {
                    candidates.push(TrieCandidate {
                        rule,
                        start: chars[i].0,
                        end: pos + ch.len_utf8(),
                    });
                }
            }
        }

        candidates
    }

    /// Rules indexed by this trie, in insertion order
    pub(crate) fn rules(&self) -> &[TrieRule] {
        &self.rules
    }

    /// True when no word/phrase triggers are indexed
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
