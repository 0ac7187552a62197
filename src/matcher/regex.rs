use super::Tally;
use crate::store::{MatchType, ReplacementRule};
use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashSet;

#[derive(Debug)]
struct CompiledPattern {
    regex: Regex,
    id: String,
    trigger: String,
    replacement: String,
}

/// Cache of compiled regex-type rules
///
/// Patterns compile once per rebuild, case-insensitively. A pattern that
/// fails to compile is skipped with a warning and the rest of the build
/// proceeds; a malformed rule must never take the dictionary down.
#[derive(Debug)]
pub struct RegexMatcher {
    patterns: Vec<CompiledPattern>,
}

impl RegexMatcher {
    /// Compiles enabled regex-type rules, skipping invalid patterns
    pub fn build<'a>(rules: impl Iterator<Item = &'a ReplacementRule>) -> Self {
        let mut patterns = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for rule in rules {
            if rule.match_type != MatchType::Regex {
                continue;
            }
            if rule.trigger.is_empty() {
                tracing::warn!(rule_id = %rule.id, "skipping rule with empty trigger");
                continue;
            }
            if !seen.insert(&rule.trigger) {
                tracing::debug!(
                    rule_id = %rule.id,
                    trigger = %rule.trigger,
                    "duplicate trigger ignored, first rule wins"
                );
                continue;
            }

            match RegexBuilder::new(&rule.trigger).case_insensitive(true).build() {
                Ok(regex) => patterns.push(CompiledPattern {
                    regex,
                    id: rule.id.clone(),
                    trigger: rule.trigger.clone(),
                    replacement: rule.replacement.clone(),
                }),
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        trigger = %rule.trigger,
                        error = %e,
                        "invalid regex pattern, rule excluded"
                    );
                }
            }
        }

        tracing::debug!(patterns = patterns.len(), "regex cache built");
        Self { patterns }
    }

    /// Applies every cached rule sequentially over the evolving text
    ///
    /// Rules run in rule order; each one finds its matches in the current
    /// text and replaces them end-to-start. Matches of different regex rules
    /// are not reconciled for overlap: each rule is independently responsible
    /// for not conflicting with others.
    pub(crate) fn apply(&self, text: &str, tally: &mut Tally) -> String {
        let mut result = text.to_owned();

        for pattern in &self.patterns {
            let matches: Vec<(usize, usize, String)> = pattern
                .regex
                .captures_iter(&result)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let replacement = expand_template(&pattern.replacement, &caps);
                    Some((whole.start(), whole.end(), replacement))
                })
                .collect();

            for _ in &matches {
                tally.record(&pattern.id, &pattern.trigger, &pattern.replacement);
            }
            for (start, end, replacement) in matches.iter().rev() {
                result.replace_range(*start..*end, replacement);
            }
        }

        result
    }

    /// Number of successfully compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no regex rules compiled
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Substitutes `$1`..`$9` with captured groups
///
/// A placeholder whose group did not participate in the match stays literal;
/// any other `$` sequence (including `$0`) passes through untouched.
fn expand_template(template: &str, caps: &Captures) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some(digit @ '1'..='9') => {
                chars.next();
                let group = digit.to_digit(10).map_or(0, |d| d as usize);
                match caps.get(group) {
                    Some(m) => out.push_str(m.as_str()),
                    None => {
                        out.push('$');
                        out.push(digit);
                    }
                }
            }
            _ => out.push('$'),
        }
    }

    out
}
