use anyhow::{Context, Result};
use chapterize::config::Config;
use chapterize::grammar::GrammarBuilder;
use chapterize::pipeline::{print_summary, run_pipeline, PipelineOptions};
use chapterize::recognize::TokenFile;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chapterize")]
#[command(version, about = "Split audiobook recordings at spoken chapter announcements")]
#[command(
    long_about = "Detect spoken chapter announcements in a directory of numbered MP3 recordings \
and split the audio into per-chapter files, using ffmpeg for audio handling and a token dump \
from an external speech recognizer."
)]
struct Cli {
    /// Directory of numbered input MP3 files
    #[arg(default_value = "mp3")]
    mp3_dir: PathBuf,

    /// Output directory for chapter segments and the report
    #[arg(short, long, default_value = "book")]
    out_dir: PathBuf,

    /// Recognizer token dump (JSON) produced against the analysis WAV
    #[arg(short, long)]
    tokens: Option<PathBuf>,

    /// Write the recognizer grammar vocabulary to this path and exit
    #[arg(long)]
    emit_grammar: Option<PathBuf>,

    /// Narration language: en, ru
    #[arg(short, long)]
    language: Option<String>,

    /// Trigger word override (defaults per language)
    #[arg(long)]
    trigger: Option<String>,

    /// Highest chapter number to generate phrases for
    #[arg(long)]
    max_chapters: Option<usize>,

    /// Also generate ordinal announcement forms
    #[arg(long)]
    include_ordinals: bool,

    /// File of extra announcement phrases, one per line
    #[arg(long)]
    phrases_file: Option<PathBuf>,

    /// Phrase announcing the start of back matter
    #[arg(long)]
    back_trigger: Option<String>,

    /// Minimum phrase confidence to keep a candidate
    #[arg(long)]
    conf_min: Option<f32>,

    /// Require strictly sequential chapter numbering
    #[arg(long)]
    sequential: bool,

    /// Minimum seconds between accepted chapter marks
    #[arg(long)]
    min_chapter_gap: Option<f64>,

    /// Minimum seconds per chapter segment
    #[arg(long)]
    min_chapter_duration: Option<f64>,

    /// silencedetect noise threshold in dB
    #[arg(long)]
    silence_threshold: Option<f64>,

    /// Minimum silence duration in seconds for the detector
    #[arg(long)]
    silence_min: Option<f64>,

    /// Required pre-trigger silence in seconds
    #[arg(long)]
    silence_pre: Option<f64>,

    /// Required post-phrase silence in seconds
    #[arg(long)]
    silence_post: Option<f64>,

    /// Analysis WAV sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Skip writing the split MP3 segments
    #[arg(long)]
    no_export: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref language) = cli.language {
        config.language = language.clone();
    }
    if let Some(ref trigger) = cli.trigger {
        config.trigger = Some(trigger.clone());
    }
    if let Some(max_chapters) = cli.max_chapters {
        config.max_chapters = max_chapters;
    }
    if cli.include_ordinals {
        config.include_ordinals = true;
    }
    if let Some(ref phrases_file) = cli.phrases_file {
        config.phrases_file = Some(phrases_file.clone());
    }
    if let Some(ref back_trigger) = cli.back_trigger {
        config.back_trigger = Some(back_trigger.clone());
    }
    if let Some(conf_min) = cli.conf_min {
        config.conf_min = conf_min;
    }
    if cli.sequential {
        config.sequential = true;
    }
    if let Some(gap) = cli.min_chapter_gap {
        config.min_chapter_gap = gap;
    }
    if let Some(duration) = cli.min_chapter_duration {
        config.min_chapter_duration = duration;
    }
    if let Some(threshold) = cli.silence_threshold {
        config.silence_threshold = threshold;
    }
    if let Some(min) = cli.silence_min {
        config.silence_min = min;
    }
    if let Some(pre) = cli.silence_pre {
        config.silence_pre = pre;
    }
    if let Some(post) = cli.silence_post {
        config.silence_post = post;
    }
    if let Some(rate) = cli.sample_rate {
        config.sample_rate = rate;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    config.validate().context("Configuration validation failed")?;

    let detection = config.detection()?;

    // Grammar export mode: write the vocabulary and exit without touching audio.
    if let Some(ref grammar_path) = cli.emit_grammar {
        let grammar = GrammarBuilder::from_config(&detection).build()?;
        std::fs::write(grammar_path, grammar.vocabulary_json()?)
            .with_context(|| format!("Failed to write grammar to {}", grammar_path.display()))?;
        info!(
            "Wrote {} phrases to {}",
            grammar.phrases().len(),
            grammar_path.display()
        );
        return Ok(());
    }

    let tokens = cli
        .tokens
        .clone()
        .ok_or_else(|| anyhow::anyhow!("A recognizer token dump is required (--tokens)"))?;
    if !tokens.exists() {
        anyhow::bail!("Token dump not found: {}", tokens.display());
    }
    if !cli.mp3_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", cli.mp3_dir.display());
    }

    info!("Input:    {}", cli.mp3_dir.display());
    info!("Output:   {}", cli.out_dir.display());
    info!("Tokens:   {}", tokens.display());
    info!("Language: {}", detection.language);
    info!("Trigger:  {}", detection.trigger_word());

    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling after the current stage...");
        cancel_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl-C handler")?;

    let recognizer = TokenFile::new(tokens, config.sample_rate);
    let options = PipelineOptions {
        export_audio: !cli.no_export,
        show_progress: true,
    };

    let result = run_pipeline(
        &cli.mp3_dir,
        &cli.out_dir,
        &recognizer,
        &config,
        options,
        cancelled,
    )
    .await
    .context("Pipeline failed")?;

    print_summary(&result);

    Ok(())
}
