//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use console::style;
use uuid::Uuid;

use crate::config::Settings;
use crate::llm::ToneClient;
use crate::models::{EmotionRecord, ToneLabel};
use crate::ocr::{TesseractEngine, TextExtractor};
use crate::pipeline::{AnalysisStage, Orchestrator};
use crate::storage::ImageStore;
use crate::store::RecordStore;

use super::progress::ProgressSink;

#[derive(Parser)]
#[command(name = "tone")]
#[command(about = "Conversation screenshot emotional-tone analysis")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory, config file, and datastore
    Init,

    /// Analyze a conversation screenshot
    Analyze {
        /// Path to the screenshot image
        image: PathBuf,
    },

    /// Browse and manage analysis history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Show the average tone score over recent days
    Stats {
        /// Number of days to include
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List all records, newest first
    List {
        /// Limit the number of records shown (0 = all)
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one record in full
    Show { id: Uuid },
    /// Delete one record
    Delete { id: Uuid },
    /// Delete every record
    Clear {
        /// Skip the confirmation requirement
        #[arg(long)]
        yes: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = Settings::resolve_data_dir(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init => init(&data_dir),
        Commands::Analyze { image } => analyze(&data_dir, &image).await,
        Commands::History { command } => history(&data_dir, command).await,
        Commands::Stats { days } => stats(&data_dir, days).await,
    }
}

fn open_store(data_dir: &std::path::Path) -> anyhow::Result<RecordStore> {
    RecordStore::open(Settings::db_path(data_dir)).context("failed to open record store")
}

fn init(data_dir: &std::path::Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    std::fs::create_dir_all(Settings::images_dir(data_dir))?;

    let config_path = data_dir.join("config.toml");
    if !config_path.exists() {
        Settings::default().save(data_dir)?;
        println!("Wrote default config to {}", config_path.display());
    }

    // Opening the store applies any pending migrations.
    let store = open_store(data_dir)?;
    println!("Database ready at {}", store.path().display());
    println!("{} {}", style("Initialized").green(), data_dir.display());
    Ok(())
}

async fn analyze(data_dir: &std::path::Path, image: &std::path::Path) -> anyhow::Result<()> {
    let settings = Settings::load(data_dir)?;
    if !settings.api.api_key_looks_valid() {
        eprintln!(
            "{} API key missing or malformed; set TONEMETER_API_KEY or edit config.toml",
            style("warning:").yellow()
        );
    }

    let image_bytes = std::fs::read(image)
        .with_context(|| format!("failed to read image {}", image.display()))?;

    let engine = TesseractEngine::new(&settings.ocr.languages)
        .with_accuracy(settings.ocr.accuracy_tier());
    let extractor =
        TextExtractor::new(Arc::new(engine)).with_min_confidence(settings.ocr.min_confidence);
    let client = ToneClient::new(settings.api.clone());
    let store = open_store(data_dir)?;
    let images = ImageStore::new(Settings::images_dir(data_dir));

    let sink = Arc::new(ProgressSink::new());
    let mut orchestrator = Orchestrator::new(Arc::new(extractor), Arc::new(client), store, images)
        .with_events(sink.clone());

    orchestrator.select_image(image_bytes);
    let session = orchestrator.analyze().await;
    sink.finish();

    match session.stage {
        AnalysisStage::Completed => {
            let result = session
                .result
                .as_ref()
                .expect("completed session always carries a result");
            println!("{}", style("Analysis complete").green().bold());
            println!(
                "  score:    {} ({})",
                style(format!("{:.0}/100", result.tone_score)).bold(),
                styled_label(result.tone_label)
            );
            println!("  keywords: {}", result.tone_keywords.join(", "));
            if let Some(reasoning) = &result.reasoning {
                println!("  reasoning: {reasoning}");
            }
            if let Some(id) = session.saved_record_id {
                println!("  record:   {id}");
            }
            Ok(())
        }
        _ => {
            let message = session
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown failure".to_string());
            bail!("{message}");
        }
    }
}

async fn history(data_dir: &std::path::Path, command: HistoryCommands) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;

    match command {
        HistoryCommands::List { limit } => {
            let records = store.list_all().await?;
            if records.is_empty() {
                println!("No records yet.");
                return Ok(());
            }
            let shown = if limit == 0 { records.len() } else { limit };
            for record in records.iter().take(shown) {
                println!(
                    "{}  {}  {:>3.0}  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.tone_score,
                    styled_label(record.tone_label),
                );
            }
            if records.len() > shown {
                println!("... and {} more", records.len() - shown);
            }
        }
        HistoryCommands::Show { id } => match store.find_by_id(id).await? {
            Some(record) => print_record(&record),
            None => bail!("no record with id {id}"),
        },
        HistoryCommands::Delete { id } => {
            if store.delete(id).await? {
                println!("Deleted {id}");
            } else {
                bail!("no record with id {id}");
            }
        }
        HistoryCommands::Clear { yes } => {
            if !yes {
                bail!("refusing to delete all records without --yes");
            }
            let removed = store.delete_all().await?;
            println!("Deleted {removed} records");
        }
    }
    Ok(())
}

async fn stats(data_dir: &std::path::Path, days: i64) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let since = Utc::now() - Duration::days(days);
    match store.average_score(since).await? {
        Some(avg) => println!("Average tone score over the last {days} days: {avg:.1}/100"),
        None => println!("No records in the last {days} days."),
    }
    Ok(())
}

fn print_record(record: &EmotionRecord) {
    println!("id:            {}", record.id);
    println!("created:       {}", record.created_at.to_rfc3339());
    println!("image:         {}", record.image_path);
    println!(
        "fingerprint:   {}",
        if record.image_hash.is_empty() {
            "(unavailable)"
        } else {
            &record.image_hash
        }
    );
    println!(
        "score:         {:.0}/100 ({})",
        record.tone_score,
        styled_label(record.tone_label)
    );
    println!("keywords:      {}", record.joined_keywords());
    println!("model:         {}", record.model_version);
    println!("text:\n{}", record.ocr_text);
}

fn styled_label(label: ToneLabel) -> console::StyledObject<&'static str> {
    match label {
        ToneLabel::Positive => style(label.as_str()).green(),
        ToneLabel::Neutral => style(label.as_str()).yellow(),
        ToneLabel::Negative => style(label.as_str()).red(),
    }
}
