use crate::matcher::fuzzy::{FuzzyConfig, FuzzyIndex};
use crate::matcher::regex::RegexMatcher;
use crate::matcher::trie::TrieMatcher;
use crate::matcher::{resolver, ReplacementCount, Tally};
use crate::store::{DictionaryStore, ReplacementRule, StoreError};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of processing one utterance (ephemeral, never persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryProcessingResult {
    /// The text as the recognizer produced it
    pub original: String,
    /// The text after all three pipeline stages
    pub processed: String,
    /// Per-rule replacement counts in first-application order
    pub replacements: Vec<ReplacementCount>,
}

impl DictionaryProcessingResult {
    fn unchanged(text: &str) -> Self {
        Self {
            original: text.to_owned(),
            processed: text.to_owned(),
            replacements: Vec::new(),
        }
    }
}

/// Trait for dictionary processing (enables testing via mocking)
///
/// The transcription pipeline takes the engine through this seam rather than
/// reaching for a global, so tests can inject `MockDictionaryProcessor` (via
/// `mockall`). Production code uses the concrete [`DictionaryEngine`].
#[cfg_attr(test, mockall::automock)]
pub trait DictionaryProcessor: Send + Sync {
    /// Applies the configured rules to one finalized utterance
    fn process(&self, text: &str) -> DictionaryProcessingResult;
}

/// The compiled matcher structures, swapped in as one unit
///
/// Built completely off to the side and installed with a single assignment,
/// so a `process` call can never pair a new trie with a stale fuzzy index.
#[derive(Debug)]
struct CompiledMatchers {
    trie: TrieMatcher,
    regexes: RegexMatcher,
    fuzzy: FuzzyIndex,
}

/// Dictionary-replacement engine: owns the rule store and the compiled
/// matcher structures, and runs the trie → regex → fuzzy pipeline
///
/// Mutations (`update_dictionary`, `set_enabled`, `clear_dictionary`) are the
/// only operations that touch the filesystem or rebuild structures; they are
/// expected to be serialized through one logical owner. `process` reads only
/// the currently-compiled structures: no I/O, no blocking, no failure path.
#[derive(Debug)]
pub struct DictionaryEngine {
    store: DictionaryStore,
    fuzzy_config: FuzzyConfig,
    compiled: Option<CompiledMatchers>,
}

impl DictionaryEngine {
    /// Creates an engine persisting to `dictionary_path`, loading any rules
    /// already on disk
    ///
    /// An unreadable or corrupt dictionary file degrades to the empty rule
    /// set with a warning; construction itself never fails on persistence.
    pub fn new(dictionary_path: PathBuf, fuzzy_config: FuzzyConfig) -> Self {
        let mut store = DictionaryStore::new(dictionary_path);
        if let Err(e) = store.load() {
            tracing::warn!(error = %e, "dictionary unavailable, starting with empty rule set");
        }

        let mut engine = Self {
            store,
            fuzzy_config,
            compiled: None,
        };
        engine.rebuild();
        engine
    }

    /// Replaces the full rule set: persists, then rebuilds the matchers
    ///
    /// The in-memory rules and compiled structures update even when the write
    /// fails, so the engine keeps serving what the caller sent; the error
    /// only reports that the rules did not reach disk.
    ///
    /// # Errors
    /// Returns [`StoreError::Persist`] on write failure
    pub fn update_dictionary(&mut self, rules: Vec<ReplacementRule>) -> Result<(), StoreError> {
        tracing::info!(count = rules.len(), "updating dictionary");
        let persisted = self.store.replace_all(rules);
        self.rebuild();
        persisted
    }

    /// Toggles whether `process` applies rules
    ///
    /// Disabling releases the compiled structures. Re-enabling reloads from
    /// persisted state when the in-memory set is empty (it may have been
    /// released), then rebuilds; a load failure degrades to the empty set.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.store.set_enabled(enabled);
        if enabled {
            if self.store.rules().is_empty() {
                if let Err(e) = self.store.load() {
                    tracing::warn!(error = %e, "dictionary unavailable on re-enable");
                }
            }
            self.rebuild();
        } else {
            tracing::info!("dictionary disabled, releasing matcher structures");
            self.compiled = None;
        }
    }

    /// Empties the rule set and deletes the persisted file
    ///
    /// # Errors
    /// Returns [`StoreError::Persist`] if the file cannot be removed
    pub fn clear_dictionary(&mut self) -> Result<(), StoreError> {
        let cleared = self.store.clear();
        self.compiled = None;
        cleared
    }

    /// Whether replacement is currently enabled
    pub const fn is_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    /// All rules currently held, enabled or not
    pub fn rules(&self) -> &[ReplacementRule] {
        self.store.rules()
    }

    /// Runs the three-stage pipeline over one finalized utterance
    ///
    /// Total function: a disabled engine or empty rule set returns the text
    /// unchanged, and every internal fault degrades to "skip and continue".
    /// Stages are strictly sequential — trie output feeds regex, regex output
    /// feeds fuzzy — and no stage re-examines later-stage text.
    pub fn process(&self, text: &str) -> DictionaryProcessingResult {
        if !self.store.is_enabled() {
            return DictionaryProcessingResult::unchanged(text);
        }
        let Some(compiled) = self.compiled.as_ref() else {
            return DictionaryProcessingResult::unchanged(text);
        };

        let mut tally = Tally::default();

        // Stage 1: exact word/phrase triggers via the trie.
        let candidates = compiled.trie.find_candidates(text);
        let accepted = resolver::resolve(&compiled.trie, text, candidates);
        let stage1 = resolver::apply(&compiled.trie, text, &accepted, &mut tally);

        // Stage 2: regex rules, sequentially in rule order.
        let stage2 = compiled.regexes.apply(&stage1, &mut tally);

        // Stage 3: fuzzy token correction.
        let stage3 = compiled.fuzzy.apply(&stage2, &mut tally);

        DictionaryProcessingResult {
            original: text.to_owned(),
            processed: stage3,
            replacements: tally.into_counts(),
        }
    }

    /// Recompiles all three matcher structures from the current rule set
    fn rebuild(&mut self) {
        if !self.store.is_enabled() || self.store.enabled_rules().next().is_none() {
            self.compiled = None;
            return;
        }

        let trie = TrieMatcher::build(self.store.enabled_rules());
        let regexes = RegexMatcher::build(self.store.enabled_rules());
        let fuzzy = FuzzyIndex::build(self.store.enabled_rules(), self.fuzzy_config);

        tracing::info!(
            trie_triggers = trie.rules().len(),
            regex_patterns = regexes.len(),
            fuzzy_triggers = fuzzy.len(),
            "matcher structures rebuilt"
        );
        self.compiled = Some(CompiledMatchers {
            trie,
            regexes,
            fuzzy,
        });
    }
}

impl DictionaryProcessor for DictionaryEngine {
    fn process(&self, text: &str) -> DictionaryProcessingResult {
        Self::process(self, text)
    }
}
