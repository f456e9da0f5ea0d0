use crate::audio::{
    check_ffmpeg, check_ffprobe, collect_numbered_mp3s, concat_inputs, detect_silences,
    export_segment, probe_duration, render_analysis_wav,
};
use crate::config::Config;
use crate::detect::{detect_chapters, ChapterBoundary, DetectionOutcome, ValidatedCandidate};
use crate::error::{ChapterizeError, Result};
use crate::grammar::GrammarBuilder;
use crate::recognize::Recognizer;
use crate::report::write_report;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Segments shorter than this are not worth writing out.
const MIN_EXPORT_DURATION: Duration = Duration::from_secs(1);

/// Options for a chapterize run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Write the split MP3 segments (disable for a dry detection run).
    pub export_audio: bool,
    /// Show progress spinners.
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            export_audio: true,
            show_progress: true,
        }
    }
}

/// Statistics from the chapter detection run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub total_time: Duration,
    pub prepare_time: Duration,
    pub silence_time: Duration,
    pub recognition_time: Duration,
    pub export_time: Duration,
    pub audio_duration: Duration,
    pub input_files: usize,
    pub silence_intervals: usize,
    pub recognized_tokens: usize,
    pub accepted_chapters: usize,
    pub exported_segments: usize,
}

/// Result of a chapterize run.
#[derive(Debug)]
pub struct PipelineResult {
    pub boundaries: Vec<ChapterBoundary>,
    pub candidates: Vec<ValidatedCandidate>,
    pub out_dir: PathBuf,
    pub report_path: PathBuf,
    pub stats: PipelineStats,
}

fn cancelled_err() -> ChapterizeError {
    ChapterizeError::Recognition("Pipeline cancelled".to_string())
}

fn stage_spinner(multi: Option<&MultiProgress>, message: &str) -> Option<ProgressBar> {
    multi.map(|mp| {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    })
}

/// Run the full chapterize pipeline over a directory of numbered MP3s.
///
/// 1. Concatenate the inputs and render the mono analysis WAV
/// 2. Map silences with the external detector
/// 3. Build the grammar and run the external recognizer
/// 4. Detect and validate chapter boundaries
/// 5. Export segments and write the chapters report
pub async fn run_pipeline(
    mp3_dir: &Path,
    out_dir: &Path,
    recognizer: &dyn Recognizer,
    config: &Config,
    options: PipelineOptions,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    config.validate()?;
    let detection = config.detection()?;
    check_ffmpeg()?;
    check_ffprobe()?;

    let temp_dir = TempDir::new()?;
    let temp_path = temp_dir.path();
    debug!("Using temp directory: {:?}", temp_path);

    std::fs::create_dir_all(out_dir)?;

    let multi_progress = options.show_progress.then(MultiProgress::new);

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Concatenate inputs, render analysis WAV
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 1/5: Preparing audio from {:?}", mp3_dir);
    let prepare_start = Instant::now();
    let pb = stage_spinner(multi_progress.as_ref(), "Preparing audio...");

    let files = collect_numbered_mp3s(mp3_dir)?;
    let concat_path = temp_path.join("concat.mp3");
    concat_inputs(&files, &concat_path, temp_path).await?;

    let analysis_wav = temp_path.join("analysis.wav");
    render_analysis_wav(&concat_path, &analysis_wav, config.sample_rate).await?;

    let total_duration = probe_duration(&concat_path)?;
    if total_duration.is_zero() {
        return Err(ChapterizeError::Audio(
            "Could not probe duration of concatenated audio".to_string(),
        ));
    }

    if let Some(pb) = pb {
        pb.finish_with_message(format!(
            "✓ Audio prepared ({:.1}s from {} files)",
            total_duration.as_secs_f64(),
            files.len()
        ));
    }
    let prepare_time = prepare_start.elapsed();

    if cancelled.load(Ordering::Relaxed) {
        return Err(cancelled_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Silence map
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 2/5: Detecting silences");
    let silence_start = Instant::now();
    let pb = stage_spinner(multi_progress.as_ref(), "Detecting silences...");

    let silences = detect_silences(&concat_path, &config.silence()).await?;

    if let Some(pb) = pb {
        pb.finish_with_message(format!("✓ {} silence intervals", silences.len()));
    }
    let silence_time = silence_start.elapsed();

    if cancelled.load(Ordering::Relaxed) {
        return Err(cancelled_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Grammar + recognition
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 3/5: Recognizing with {}", recognizer.name());
    let recognition_start = Instant::now();
    let pb = stage_spinner(multi_progress.as_ref(), "Recognizing trigger phrases...");

    let grammar = GrammarBuilder::from_config(&detection).build()?;
    let tokens = recognizer.recognize(&analysis_wav, &grammar).await?;

    if let Some(pb) = pb {
        pb.finish_with_message(format!("✓ {} recognized tokens", tokens.len()));
    }
    let recognition_time = recognition_start.elapsed();

    if cancelled.load(Ordering::Relaxed) {
        return Err(cancelled_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 4: Chapter detection
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 4/5: Detecting chapter boundaries");
    let pb = stage_spinner(multi_progress.as_ref(), "Validating candidates...");

    let outcome: DetectionOutcome =
        detect_chapters(&tokens, &silences, &grammar, &detection, total_duration)?;

    if outcome.stats.accepted == 0 {
        warn!("No chapters detected; the whole recording becomes the preface segment");
    }

    if let Some(pb) = pb {
        pb.finish_with_message(format!(
            "✓ {} boundaries ({} accepted candidates)",
            outcome.boundaries.len(),
            outcome.stats.accepted
        ));
    }

    if cancelled.load(Ordering::Relaxed) {
        return Err(cancelled_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 5: Export + report
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 5/5: Writing output to {:?}", out_dir);
    let export_start = Instant::now();
    let pb = stage_spinner(multi_progress.as_ref(), "Exporting segments...");

    let mut exported = 0;
    if options.export_audio {
        for boundary in &outcome.boundaries {
            if cancelled.load(Ordering::Relaxed) {
                return Err(cancelled_err());
            }
            if boundary.duration() < MIN_EXPORT_DURATION {
                debug!("Skipping microscopic segment {}", boundary.file_stem());
                continue;
            }
            let out_path = out_dir.join(format!("{}.mp3", boundary.file_stem()));
            export_segment(&concat_path, &out_path, boundary.start, boundary.end).await?;
            exported += 1;
        }
    }

    let report_path = out_dir.join("chapters.json");
    write_report(&report_path, &outcome, mp3_dir.to_str(), total_duration)?;

    if let Some(pb) = pb {
        pb.finish_with_message(format!("✓ {} segments exported", exported));
    }
    let export_time = export_start.elapsed();

    info!(
        "Wrote {} segments and {:?} in {:.2}s",
        exported,
        report_path,
        export_time.as_secs_f64()
    );

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        prepare_time,
        silence_time,
        recognition_time,
        export_time,
        audio_duration: total_duration,
        input_files: files.len(),
        silence_intervals: silences.len(),
        recognized_tokens: tokens.len(),
        accepted_chapters: outcome.stats.accepted,
        exported_segments: exported,
    };

    Ok(PipelineResult {
        boundaries: outcome.boundaries,
        candidates: outcome.candidates,
        out_dir: out_dir.to_path_buf(),
        report_path,
        stats,
    })
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                   Chapter Detection Complete                   ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.out_dir.display());
    println!("  Report:     {}", result.report_path.display());
    println!("  Chapters:   {}", result.stats.accepted_chapters);
    println!("  Segments:   {}", result.stats.exported_segments);
    println!(
        "  Duration:   {:.1}s audio in {} files",
        result.stats.audio_duration.as_secs_f64(),
        result.stats.input_files
    );
    println!();
    println!("  Timing:");
    println!(
        "    Prepare:     {:.2}s",
        result.stats.prepare_time.as_secs_f64()
    );
    println!(
        "    Silences:    {:.2}s ({} intervals)",
        result.stats.silence_time.as_secs_f64(),
        result.stats.silence_intervals
    );
    println!(
        "    Recognize:   {:.2}s ({} tokens)",
        result.stats.recognition_time.as_secs_f64(),
        result.stats.recognized_tokens
    );
    println!(
        "    Export:      {:.2}s",
        result.stats.export_time.as_secs_f64()
    );
    println!(
        "    Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    for boundary in &result.boundaries {
        println!(
            "    {:>9.1}s  {}",
            boundary.start.as_secs_f64(),
            boundary.label
        );
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
