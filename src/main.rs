use anyhow::Result;
use std::io::BufRead;
use whisper_dictionary::config::Config;
use whisper_dictionary::engine::DictionaryEngine;
use whisper_dictionary::telemetry;

/// Line-oriented driver: reads utterances from stdin, prints the processed
/// text. Useful for exercising a dictionary file without the full
/// transcription pipeline.
fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;
    println!("✓ Config loaded from ~/.whisper-dictionary.toml");

    // Initialize telemetry
    telemetry::init(config.telemetry.enabled, &config.telemetry.log_path)?;
    tracing::info!("whisper-dictionary starting");

    let dictionary_path = Config::expand_path(&config.dictionary.path)?;
    let engine = DictionaryEngine::new(dictionary_path, config.fuzzy);
    println!(
        "✓ Dictionary loaded: {} rules from {}",
        engine.rules().len(),
        config.dictionary.path
    );
    println!("\nType an utterance per line (Ctrl+D to exit).\n");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let result = engine.process(&line);
        for replacement in &result.replacements {
            tracing::debug!(
                trigger = %replacement.trigger,
                replacement = %replacement.replacement,
                count = replacement.count,
                "rule applied"
            );
        }
        println!("{}", result.processed);
    }

    Ok(())
}
