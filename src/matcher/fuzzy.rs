use super::Tally;
use crate::store::{MatchType, ReplacementRule};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Tunables for approximate matching
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FuzzyConfig {
    /// Maximum deletions per side when indexing and querying (SymSpell K)
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: usize,
    /// Tokens shorter than this (in chars) are never fuzzy-matched
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    /// Minimum normalized Damerau-Levenshtein similarity to keep a candidate
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Minimum score gap between best and runner-up for an unambiguous accept
    #[serde(default = "default_margin")]
    pub margin: f64,
}

const fn default_max_edit_distance() -> usize {
    2
}
const fn default_min_token_len() -> usize {
    4
}
const fn default_similarity_threshold() -> f64 {
    0.7
}
const fn default_margin() -> f64 {
    0.1
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: default_max_edit_distance(),
            min_token_len: default_min_token_len(),
            similarity_threshold: default_similarity_threshold(),
            margin: default_margin(),
        }
    }
}

#[derive(Debug, Clone)]
struct FuzzyRule {
    id: String,
    trigger: String,
    trigger_lower: String,
    replacement: String,
}

/// A maximal alphanumeric run, byte offsets into the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) text: String,
}

/// Delete-distance index over fuzzy-type triggers (SymSpell-style)
///
/// Every trigger is expanded into all strings reachable by deleting up to K
/// chars; a query expands the input token the same way and intersects the two
/// variant sets via one hash lookup per variant. That captures edits in
/// either direction without comparing every token against every trigger.
/// Survivors are then scored with true Damerau-Levenshtein distance, so the
/// index only ever over-approximates the candidate set, never the accepted
/// matches.
#[derive(Debug)]
pub struct FuzzyIndex {
    config: FuzzyConfig,
    rules: Vec<FuzzyRule>,
    /// delete variant → indices of rules that can produce it
    deletes: HashMap<String, Vec<usize>>,
    /// Verbatim lowercased triggers: exact-known-word fast path
    exact: HashSet<String>,
}

impl FuzzyIndex {
    /// Indexes enabled fuzzy-type rules
    pub fn build<'a>(rules: impl Iterator<Item = &'a ReplacementRule>, config: FuzzyConfig) -> Self {
        let mut index = Self {
            config,
            rules: Vec::new(),
            deletes: HashMap::new(),
            exact: HashSet::new(),
        };

        for rule in rules {
            if rule.match_type != MatchType::Fuzzy {
                continue;
            }
            if rule.trigger.is_empty() {
                tracing::warn!(rule_id = %rule.id, "skipping rule with empty trigger");
                continue;
            }

            let trigger_lower = rule.trigger.to_lowercase();
            if !index.exact.insert(trigger_lower.clone()) {
                tracing::debug!(
                    rule_id = %rule.id,
                    trigger = %rule.trigger,
                    "duplicate trigger ignored, first rule wins"
                );
                continue;
            }

            let rule_index = index.rules.len();
            for variant in delete_variants(&trigger_lower, config.max_edit_distance) {
                index.deletes.entry(variant).or_default().push(rule_index);
            }
            index.rules.push(FuzzyRule {
                id: rule.id.clone(),
                trigger: rule.trigger.clone(),
                trigger_lower,
                replacement: rule.replacement.clone(),
            });
        }

        tracing::debug!(
            triggers = index.rules.len(),
            variants = index.deletes.len(),
            "fuzzy index built"
        );
        index
    }

    /// Rewrites near-miss tokens, tallying per-rule counts
    ///
    /// Tokens shorter than the minimum, exact known triggers, and ambiguous
    /// matches are all left unchanged. Accepted replacements apply
    /// end-to-start so earlier byte offsets stay valid.
    pub(crate) fn apply(&self, text: &str, tally: &mut Tally) -> String {
        if self.rules.is_empty() {
            return text.to_owned();
        }

        let mut accepted: Vec<(Token, usize)> = Vec::new();
        for token in tokenize(text) {
            let token_lower = token.text.to_lowercase();
            if token_lower.chars().count() < self.config.min_token_len {
                continue;
            }
            // An exact known trigger needs no correction.
            if self.exact.contains(&token_lower) {
                continue;
            }
            if let Some(rule_index) = self.best_match(&token_lower) {
                tracing::debug!(
                    token = %token.text,
                    trigger = %self.rules[rule_index].trigger,
                    "fuzzy match accepted"
                );
                accepted.push((token, rule_index));
            }
        }

        for (_, rule_index) in &accepted {
            let rule = &self.rules[*rule_index];
            tally.record(&rule.id, &rule.trigger, &rule.replacement);
        }

        let mut result = text.to_owned();
        for (token, rule_index) in accepted.iter().rev() {
            result.replace_range(token.start..token.end, &self.rules[*rule_index].replacement);
        }
        result
    }

    /// Scores index candidates for one token and accepts only an unambiguous
    /// winner: sole survivor, or ahead of the runner-up by at least the
    /// configured margin.
    fn best_match(&self, token_lower: &str) -> Option<usize> {
        let mut seen = HashSet::new();
        let mut candidates: Vec<usize> = Vec::new();
        for variant in delete_variants(token_lower, self.config.max_edit_distance) {
            if let Some(rule_indices) = self.deletes.get(&variant) {
                for &rule_index in rule_indices {
                    if seen.insert(rule_index) {
                        candidates.push(rule_index);
                    }
                }
            }
        }
        // Rule order breaks score ties deterministically.
        candidates.sort_unstable();

        let mut scored: Vec<(usize, f64)> = candidates
            .into_iter()
            .filter_map(|rule_index| {
                let similarity = strsim::normalized_damerau_levenshtein(
                    token_lower,
                    &self.rules[rule_index].trigger_lower,
                );
                (similarity >= self.config.similarity_threshold).then_some((rule_index, similarity))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        match scored.as_slice() {
            [] => None,
            [(rule_index, _)] => Some(*rule_index),
            [(best_index, best), (_, runner_up), ..] => {
                if best - runner_up >= self.config.margin {
                    Some(*best_index)
                } else {
                    tracing::debug!(
                        token = %token_lower,
                        best = %best,
                        runner_up = %runner_up,
                        "ambiguous fuzzy match, token left unchanged"
                    );
                    None
                }
            }
        }
    }

    /// True when no fuzzy triggers are indexed
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of indexed fuzzy triggers
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// All strings reachable from `word` by deleting up to `max_deletes` chars,
/// including `word` itself
///
/// Expansion is breadth-first over deletion depth, removing one char by index
/// per step; no recursion, memory bounded by the variant set itself. Words
/// are never shortened below one char.
fn delete_variants(word: &str, max_deletes: usize) -> HashSet<String> {
    let mut variants = HashSet::new();
    variants.insert(word.to_owned());

    let mut frontier: Vec<Vec<char>> = vec![word.chars().collect()];
    for _ in 0..max_deletes {
        let mut next_frontier = Vec::new();
        for chars in &frontier {
            if chars.len() <= 1 {
                continue;
            }
            for i in 0..chars.len() {
                let mut shorter = chars.clone();
                shorter.remove(i);
                let variant: String = shorter.iter().collect();
                if variants.insert(variant) {
                    next_frontier.push(shorter);
                }
            }
        }
        frontier = next_frontier;
    }

    variants
}

/// Splits text into maximal alphanumeric runs with byte offsets
///
/// Every non-alphanumeric char is a delimiter, underscore included; the
/// word-boundary definition used by the trie resolver does not apply here.
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (pos, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if start.is_none() {
                start = Some(pos);
            }
        } else if let Some(token_start) = start.take() {
            tokens.push(Token {
                start: token_start,
                end: pos,
                text: text[token_start..pos].to_owned(),
            });
        }
    }
    if let Some(token_start) = start {
        tokens.push(Token {
            start: token_start,
            end: text.len(),
            text: text[token_start..].to_owned(),
        });
    }

    tokens
}
