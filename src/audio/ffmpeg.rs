use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ChapterizeError, Result};

use super::AudioMetadata;

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| {
            ChapterizeError::Audio(format!(
                "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(ChapterizeError::Audio("FFmpeg check failed".to_string()));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map_err(|e| {
            ChapterizeError::Audio(format!(
                "FFprobe not found. Please install FFmpeg (includes FFprobe). Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(ChapterizeError::Audio("FFprobe check failed".to_string()));
    }

    debug!("FFprobe is available");
    Ok(())
}

/// Get audio duration using FFprobe.
pub fn probe_duration(input: &Path) -> Result<Duration> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .map_err(|e| ChapterizeError::Audio(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ChapterizeError::Audio(format!("FFprobe failed: {stderr}")));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = duration_str.trim().parse().map_err(|e| {
        ChapterizeError::Audio(format!(
            "Failed to parse duration '{}': {e}",
            duration_str.trim()
        ))
    })?;

    Ok(Duration::from_secs_f64(duration_secs))
}

/// Find the numbered MP3 files of a recording, sorted by their zero-padded
/// stem so `2.mp3` sorts before `10.mp3`.
pub fn collect_numbered_mp3s(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(ChapterizeError::FileNotFound(dir.display().to_string()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("mp3"))
                .unwrap_or(false)
        })
        .collect();

    if files.is_empty() {
        return Err(ChapterizeError::Audio(format!(
            "No MP3 files found in {}. Expected NN.mp3",
            dir.display()
        )));
    }

    files.sort_by_key(|p| {
        let stem = p
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{:0>3}", stem)
    });

    Ok(files)
}

/// Concatenate the source files losslessly via the FFmpeg concat demuxer.
pub async fn concat_inputs(files: &[PathBuf], output: &Path, workdir: &Path) -> Result<()> {
    let list: String = files
        .iter()
        .map(|p| format!("file '{}'\n", p.canonicalize().unwrap_or_else(|_| p.clone()).display()))
        .collect();

    let list_path = workdir.join("concat.txt");
    std::fs::write(&list_path, list)?;

    info!("Concatenating {} input files", files.len());

    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c", "copy"])
        .arg(output)
        .status()
        .map_err(|e| ChapterizeError::Audio(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ChapterizeError::Audio(
            "FFmpeg concatenation failed".to_string(),
        ));
    }
    if !output.exists() {
        return Err(ChapterizeError::Audio(
            "Concatenated file was not created".to_string(),
        ));
    }

    Ok(())
}

/// Render the mono analysis WAV the recognizer consumes.
pub async fn render_analysis_wav(
    input: &Path,
    output: &Path,
    sample_rate: u32,
) -> Result<AudioMetadata> {
    if !input.exists() {
        return Err(ChapterizeError::FileNotFound(input.display().to_string()));
    }

    let duration = probe_duration(input)?;
    debug!("Input duration: {:?}", duration);

    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-y", "-i"])
        .arg(input)
        .args(["-ac", "1", "-ar"])
        .arg(sample_rate.to_string())
        .arg(output)
        .status()
        .map_err(|e| ChapterizeError::Audio(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ChapterizeError::Audio(
            "FFmpeg analysis WAV rendering failed".to_string(),
        ));
    }

    info!("Analysis WAV rendered to {}", output.display());

    Ok(AudioMetadata {
        duration,
        sample_rate,
        channels: 1,
    })
}

/// Export one chapter segment as MP3 between start and end times.
pub async fn export_segment(
    input: &Path,
    output: &Path,
    start: Duration,
    end: Duration,
) -> Result<()> {
    if !input.exists() {
        return Err(ChapterizeError::FileNotFound(input.display().to_string()));
    }

    let start_secs = format!("{:.3}", start.as_secs_f64());
    let end_secs = format!("{:.3}", end.as_secs_f64());

    debug!("Exporting segment {} -> {}", start_secs, end_secs);

    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-y", "-ss"])
        .arg(&start_secs)
        .args(["-to"])
        .arg(&end_secs)
        .args(["-i"])
        .arg(input)
        .args(["-c:a", "libmp3lame", "-q:a", "2"])
        .arg(output)
        .status()
        .map_err(|e| ChapterizeError::Audio(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ChapterizeError::Audio(
            "FFmpeg segment export failed".to_string(),
        ));
    }

    Ok(())
}
