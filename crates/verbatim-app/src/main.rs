//! Verbatim application binary - composition root.
//!
//! Ties the workspace crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the speaker and preference stores under the data directory
//! 3. Load the quote corpus into the in-memory full-text index
//! 4. Build the speaker router, retrieval engine and dialogue manager
//! 5. Optionally serve the read-only lookup API
//! 6. Drive turns from stdin until EOF
//!
//! Provider integrations (ASR, TTS, speaker embeddings, the language
//! model) plug in at the `TurnProviders` boundary; this binary wires the
//! `Null*` stand-ins and therefore runs text-only. Every turn still goes
//! through the full identify/route/dispatch/answer pipeline.

mod cli;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use verbatim_api::AppState;
use verbatim_core::config::VerbatimConfig;
use verbatim_core::providers::{NullAsr, NullCapture, NullEmbedding, NullLanguageModel, NullTts};
use verbatim_core::types::Utterance;
use verbatim_dialogue::{Assistant, DialogueManager, TurnProviders};
use verbatim_intent::IntentMapper;
use verbatim_retrieval::{MemoryIndex, RetrievalEngine};
use verbatim_speaker::{SpeakerRegistry, SpeakerRouter};
use verbatim_store::{PrefsStore, SpeakerStore};

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. An explicit --config that fails to load is fatal; the default
    // location falls back to built-in defaults.
    let config_file = args.resolve_config_path();
    let config = if args.config.is_some() {
        VerbatimConfig::load(&config_file)?
    } else {
        VerbatimConfig::load_or_default(&config_file)
    };

    // Tracing. Priority: RUST_LOG env > --log-level flag > config file.
    let level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    tracing::info!("Starting Verbatim v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Stores.
    let data_dir = resolve_data_dir(
        &args
            .resolve_data_dir()
            .unwrap_or_else(|| config.general.data_dir.clone()),
    );
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let speaker_store = SpeakerStore::new(data_dir.join("speakers.json"));
    let prefs_store = PrefsStore::new(data_dir.join("voice_prefs.json"));

    // Quote corpus.
    let index = match args.corpus {
        Some(ref path) => {
            let index = MemoryIndex::load(path)?;
            tracing::info!(path = %path.display(), quotes = index.len(), "Quote corpus loaded");
            index
        }
        None => {
            tracing::warn!("No --corpus given; the quote index is empty");
            MemoryIndex::new()
        }
    };
    let index = Arc::new(index);

    // Speaker routing. Without an embedding provider integration the router
    // stays constructed but inert.
    let mut speaker_config = config.speaker.clone();
    if args.no_speaker_id {
        speaker_config.enabled = false;
    }
    let registry = SpeakerRegistry::load(&speaker_store)?;
    tracing::info!(identities = registry.len(), "Speaker registry loaded");
    let router = SpeakerRouter::new(registry, Arc::new(NullEmbedding), speaker_config);

    // Retrieval and dialogue.
    let retrieval = RetrievalEngine::new(index.clone(), config.retrieval.clone());
    let llm = Arc::new(NullLanguageModel);
    let dialogue = DialogueManager::new(retrieval, llm.clone());

    let mapper = if config.intent.llm_fallback && !args.no_llm_fallback {
        Some(IntentMapper::new(llm))
    } else {
        None
    };
    let providers = TurnProviders {
        asr: Arc::new(NullAsr),
        tts: Arc::new(NullTts),
        capture: Arc::new(NullCapture),
        mapper,
    };

    let mut assistant = Assistant::new(
        &config,
        router,
        dialogue,
        providers,
        speaker_store,
        prefs_store,
    );

    // Lookup API.
    let port = args.resolve_port(config.api.port);
    if config.api.enabled || args.port.is_some() {
        let state = AppState::new(index.clone(), config.retrieval.index_name.clone());
        tokio::spawn(async move {
            if let Err(e) = verbatim_api::serve(state, port).await {
                tracing::error!(port, error = %e, "Lookup API failed — is another instance running?");
            }
        });
    }

    // Turn loop: one typed line is one turn.
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }
        let outcome = assistant.handle_turn(Utterance::from_text(text));
        writeln!(stdout, "[{}] {}", outcome.session, outcome.reply)?;
    }

    tracing::info!("Shutting down");
    Ok(())
}
