use super::trie::{TrieCandidate, TrieMatcher};
use super::Tally;
use crate::store::MatchType;

/// Word chars are alphanumeric or underscore; everything else (and the
/// string's ends) is a boundary.
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn has_word_boundaries(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .is_none_or(|ch| !is_word_char(ch));
    let after_ok = text[end..].chars().next().is_none_or(|ch| !is_word_char(ch));
    before_ok && after_ok
}

/// Validates boundaries and resolves overlaps among trie candidates
///
/// Word-type candidates without a boundary on both sides are dropped; phrase
/// candidates match anywhere, including inside other words. Survivors are
/// swept left to right, longest trigger first at equal starts, accepting only
/// candidates that begin at or after the previous acceptance's end. The
/// result is greedy, leftmost, non-overlapping.
pub fn resolve(
    matcher: &TrieMatcher,
    text: &str,
    mut candidates: Vec<TrieCandidate>,
) -> Vec<TrieCandidate> {
    candidates.retain(|c| {
        let rule = &matcher.rules()[c.rule];
        match rule.match_type {
            MatchType::Word => has_word_boundaries(text, c.start, c.end),
            _ => true,
        }
    });

    // Equal starts: larger end means longer trigger, preferred.
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut accepted: Vec<TrieCandidate> = Vec::new();
    let mut last_end = 0;
    for candidate in candidates {
        if candidate.start >= last_end {
            last_end = candidate.end;
            accepted.push(candidate);
        }
    }
    accepted
}

/// Applies accepted candidates to the text, tallying per-rule counts
///
/// Replacement runs end-to-start so earlier byte offsets stay valid as the
/// string changes length.
pub(crate) fn apply(
    matcher: &TrieMatcher,
    text: &str,
    accepted: &[TrieCandidate],
    tally: &mut Tally,
) -> String {
    for candidate in accepted {
        let rule = &matcher.rules()[candidate.rule];
        tally.record(&rule.id, &rule.trigger, &rule.replacement);
    }

    let mut result = text.to_owned();
    for candidate in accepted.iter().rev() {
        let rule = &matcher.rules()[candidate.rule];
        result.replace_range(candidate.start..candidate.end, &rule.replacement);
    }
    result
}
