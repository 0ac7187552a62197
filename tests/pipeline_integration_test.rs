//! Integration tests for the dictionary-replacement pipeline
//!
//! These tests verify the end-to-end behavior of:
//! - The three-stage pipeline (trie → regex → fuzzy) over real rule sets
//! - Rule mutation (update, enable/disable, clear) and rebuild semantics
//! - JSON persistence and crash-safety of the dictionary file
//!
//! Each test uses its own temp directory, so they run in parallel without
//! touching the real dictionary path.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use whisper_dictionary::{
    DictionaryEngine, FuzzyConfig, MatchType, ReplacementRule,
};

fn create_test_dir() -> PathBuf {
    let test_dir = std::env::temp_dir().join(format!(
        "whisper_dictionary_pipeline_test_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&test_dir).unwrap();
    test_dir
}

fn rule(id: &str, trigger: &str, replacement: &str, match_type: MatchType) -> ReplacementRule {
    ReplacementRule {
        id: id.to_owned(),
        trigger: trigger.to_owned(),
        replacement: replacement.to_owned(),
        match_type,
        enabled: true,
    }
}

#[test]
fn test_noop_invariant_empty_rules() {
    let dir = create_test_dir();
    let engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());

    for text in ["", "plain text", "ünïcode 🎤 text", "9am cat kubernettes"] {
        let result = engine.process(text);
        assert_eq!(result.original, text);
        assert_eq!(result.processed, text);
        assert!(result.replacements.is_empty());
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_noop_invariant_disabled_engine() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "cat", "feline", MatchType::Word)])
        .unwrap();
    engine.set_enabled(false);

    let result = engine.process("the cat sat");
    assert_eq!(result.processed, "the cat sat");
    assert!(result.replacements.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_word_boundary_invariant() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "cat", "feline", MatchType::Word)])
        .unwrap();

    assert_eq!(engine.process("the cat sat").processed, "the feline sat");
    assert_eq!(engine.process("category").processed, "category");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_phrase_type_leniency() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "ny", "New York", MatchType::Phrase)])
        .unwrap();

    // Phrase triggers deliberately skip the boundary check and may match
    // inside other words.
    assert_eq!(engine.process("Sunny day").processed, "SunNew York day");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_longest_match_overlap_resolution() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![
            rule("1", "new york", "NYC", MatchType::Phrase),
            rule("2", "new york city", "NYC2", MatchType::Phrase),
        ])
        .unwrap();

    let result = engine.process("I love new york city");
    assert_eq!(result.processed, "I love NYC2");
    assert_eq!(result.replacements.len(), 1);
    assert_eq!(result.replacements[0].trigger, "new york city");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_regex_capture_substitution() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", r"(\d+)am", "$1:00 AM", MatchType::Regex)])
        .unwrap();

    assert_eq!(engine.process("9am").processed, "9:00 AM");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_fuzzy_correction_accepted() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "kubernetes", "Kubernetes", MatchType::Fuzzy)])
        .unwrap();

    let result = engine.process("I love kubernettes");
    assert_eq!(result.processed, "I love Kubernetes");
    assert_eq!(result.replacements.len(), 1);
    assert_eq!(result.replacements[0].count, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_fuzzy_correction_withheld() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![
            rule("1", "grape", "GRAPE", MatchType::Fuzzy),
            rule("2", "grade", "GRADE", MatchType::Fuzzy),
            rule("3", "knob", "Knob", MatchType::Fuzzy),
        ])
        .unwrap();

    // Two candidates score identically: ambiguous, withheld.
    assert_eq!(engine.process("a grane").processed, "a grane");
    // Below the minimum token length: withheld.
    assert_eq!(engine.process("kob").processed, "kob");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_rebuild_before_use() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());

    engine
        .update_dictionary(vec![rule("1", "cat", "feline", MatchType::Word)])
        .unwrap();
    assert_eq!(engine.process("cat").processed, "feline");

    // A full replace must leave no stale matches behind.
    engine
        .update_dictionary(vec![rule("2", "dog", "canine", MatchType::Word)])
        .unwrap();
    assert_eq!(engine.process("cat and dog").processed, "cat and canine");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_full_pipeline_all_stages() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![
            rule("1", "omw", "on my way", MatchType::Word),
            rule("2", r"(\d+)\s*pm", "$1:00 PM", MatchType::Regex),
            rule("3", "terraform", "Terraform", MatchType::Fuzzy),
        ])
        .unwrap();

    let result = engine.process("omw, running terrafrom until 5 pm");
    assert_eq!(
        result.processed,
        "on my way, running Terraform until 5:00 PM"
    );
    assert_eq!(result.replacements.len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_persistence_across_engine_instances() {
    let dir = create_test_dir();
    let path = dir.join("dictionary.json");

    {
        let mut engine = DictionaryEngine::new(path.clone(), FuzzyConfig::default());
        engine
            .update_dictionary(vec![rule("1", "brb", "be right back", MatchType::Word)])
            .unwrap();
    }

    let engine = DictionaryEngine::new(path, FuzzyConfig::default());
    assert_eq!(engine.process("brb").processed, "be right back");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_persisted_file_is_plain_json_array() {
    let dir = create_test_dir();
    let path = dir.join("dictionary.json");

    let mut engine = DictionaryEngine::new(path.clone(), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "brb", "be right back", MatchType::Word)])
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let array = parsed.as_array().unwrap();
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["trigger"], "brb");
    assert_eq!(array[0]["matchType"], "word");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_crash_safety_interrupted_write() {
    let dir = create_test_dir();
    let path = dir.join("dictionary.json");

    let mut engine = DictionaryEngine::new(path.clone(), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "brb", "be right back", MatchType::Word)])
        .unwrap();

    // Simulate a crash mid-write: a half-written temp file next to the real
    // one. The committed file must still load cleanly.
    std::fs::write(path.with_extension("tmp"), b"[{\"id\":\"trunc").unwrap();

    let engine = DictionaryEngine::new(path, FuzzyConfig::default());
    assert_eq!(engine.process("brb").processed, "be right back");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_corrupt_dictionary_file_degrades_to_passthrough() {
    let dir = create_test_dir();
    let path = dir.join("dictionary.json");
    std::fs::write(&path, b"not json at all").unwrap();

    // Dictionary unavailable, never a crash: process still returns the
    // original text.
    let engine = DictionaryEngine::new(path, FuzzyConfig::default());
    let result = engine.process("hello there");
    assert_eq!(result.processed, "hello there");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_clear_then_reenable_stays_empty() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "cat", "feline", MatchType::Word)])
        .unwrap();

    engine.clear_dictionary().unwrap();
    engine.set_enabled(false);
    engine.set_enabled(true);

    // Nothing persisted anymore, so re-enabling reloads the empty set.
    assert_eq!(engine.process("cat").processed, "cat");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_mixed_rule_types_with_invalid_regex() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![
            rule("bad", r"[unclosed", "X", MatchType::Regex),
            rule("1", "teh", "the", MatchType::Word),
            rule("2", "kubernetes", "Kubernetes", MatchType::Fuzzy),
        ])
        .unwrap();

    // The malformed regex is excluded; everything else still applies.
    let result = engine.process("teh kubernets cluster");
    assert_eq!(result.processed, "the Kubernetes cluster");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_counts_aggregate_across_stages() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![
            rule("1", "go", "Go", MatchType::Word),
            rule("2", r"(\d+)x", "$1 times", MatchType::Regex),
        ])
        .unwrap();

    let result = engine.process("go go, repeat 3x then 2x");
    assert_eq!(result.processed, "Go Go, repeat 3 times then 2 times");
    assert_eq!(result.replacements.len(), 2);
    assert_eq!(result.replacements[0].trigger, "go");
    assert_eq!(result.replacements[0].count, 2);
    assert_eq!(result.replacements[1].trigger, r"(\d+)x");
    assert_eq!(result.replacements[1].count, 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_unicode_text_round_trips_safely() {
    let dir = create_test_dir();
    let mut engine = DictionaryEngine::new(dir.join("dictionary.json"), FuzzyConfig::default());
    engine
        .update_dictionary(vec![rule("1", "café", "coffee shop", MatchType::Word)])
        .unwrap();

    let result = engine.process("meet at the Café, 9 Uhr ☕");
    assert_eq!(result.processed, "meet at the coffee shop, 9 Uhr ☕");

    let _ = std::fs::remove_dir_all(&dir);
}
