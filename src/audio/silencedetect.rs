use std::path::Path;
use std::process::Command;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::SilenceDetectConfig;
use crate::error::{ChapterizeError, Result};

use super::SilenceInterval;

/// Run the external FFmpeg silencedetect filter over the whole recording.
///
/// Detection stays in FFmpeg; this adapter only shells out and parses the
/// filter's log lines into ordered, non-overlapping intervals.
pub async fn detect_silences(
    input: &Path,
    config: &SilenceDetectConfig,
) -> Result<Vec<SilenceInterval>> {
    if !input.exists() {
        return Err(ChapterizeError::FileNotFound(input.display().to_string()));
    }

    let filter = format!(
        "silencedetect=noise={}dB:d={}",
        config.noise_db,
        config.min_silence.as_secs_f64()
    );

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-nostats", "-i"])
        .arg(input)
        .args(["-af", &filter, "-f", "null", "-"])
        .output()
        .map_err(|e| ChapterizeError::Audio(format!("Failed to run FFmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ChapterizeError::Audio(format!(
            "FFmpeg silencedetect failed: {stderr}"
        )));
    }

    // silencedetect logs to stderr
    let log = String::from_utf8_lossy(&output.stderr);
    let silences = parse_silencedetect_log(&log);

    if silences.is_empty() {
        warn!(
            "No silences detected; consider adjusting the noise threshold ({} dB)",
            config.noise_db
        );
    } else {
        info!("Detected {} silence intervals", silences.len());
    }

    Ok(silences)
}

/// Parse `silence_start:` / `silence_end:` lines from the filter log.
pub fn parse_silencedetect_log(log: &str) -> Vec<SilenceInterval> {
    let start_re = Regex::new(r"silence_start:\s*(-?[0-9]+\.?[0-9]*)").unwrap();
    let end_re = Regex::new(r"silence_end:\s*(-?[0-9]+\.?[0-9]*)").unwrap();

    let mut raw: Vec<(f64, f64)> = Vec::new();
    let mut last_start: Option<f64> = None;

    for line in log.lines() {
        if let Some(caps) = start_re.captures(line) {
            last_start = caps[1].parse().ok();
        } else if let Some(caps) = end_re.captures(line) {
            if let Ok(end) = caps[1].parse::<f64>() {
                // FFmpeg occasionally emits an end without a start; treat
                // it as a degenerate zero-length span.
                let start = last_start.take().unwrap_or(end);
                raw.push((start.max(0.0), end.max(start.max(0.0))));
            }
        }
    }

    raw.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    // Coalesce overlaps so the silence map's ordering contract holds
    let mut silences: Vec<SilenceInterval> = Vec::with_capacity(raw.len());
    for (start, end) in raw {
        let interval = SilenceInterval {
            start: Duration::from_secs_f64(start),
            end: Duration::from_secs_f64(end),
        };
        match silences.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => silences.push(interval),
        }
    }

    debug!("Parsed {} silence intervals", silences.len());
    silences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_parse_basic_log() {
        let log = "\
[silencedetect @ 0x55d] silence_start: 9.01234
[silencedetect @ 0x55d] silence_end: 10.0 | silence_duration: 0.98766
[silencedetect @ 0x55d] silence_start: 100.5
[silencedetect @ 0x55d] silence_end: 101.25 | silence_duration: 0.75
";
        let silences = parse_silencedetect_log(log);

        assert_eq!(silences.len(), 2);
        assert_eq!(silences[0].start, secs(9.01234));
        assert_eq!(silences[0].end, secs(10.0));
        assert_eq!(silences[1].start, secs(100.5));
    }

    #[test]
    fn test_parse_end_without_start() {
        let log = "[silencedetect @ 0x55d] silence_end: 5.0 | silence_duration: 1.0\n";
        let silences = parse_silencedetect_log(log);

        assert_eq!(silences.len(), 1);
        assert_eq!(silences[0].start, silences[0].end);
    }

    #[test]
    fn test_parse_clamps_negative_start() {
        let log = "\
[silencedetect @ 0x55d] silence_start: -0.01
[silencedetect @ 0x55d] silence_end: 0.8 | silence_duration: 0.81
";
        let silences = parse_silencedetect_log(log);
        assert_eq!(silences[0].start, Duration::ZERO);
    }

    #[test]
    fn test_parse_coalesces_overlaps() {
        let log = "\
[silencedetect @ 0x55d] silence_start: 1.0
[silencedetect @ 0x55d] silence_end: 3.0 | silence_duration: 2.0
[silencedetect @ 0x55d] silence_start: 2.5
[silencedetect @ 0x55d] silence_end: 4.0 | silence_duration: 1.5
";
        let silences = parse_silencedetect_log(log);

        assert_eq!(silences.len(), 1);
        assert_eq!(silences[0].start, secs(1.0));
        assert_eq!(silences[0].end, secs(4.0));
    }

    #[test]
    fn test_parse_empty_log() {
        assert!(parse_silencedetect_log("frame=1 fps=0").is_empty());
    }

    #[test]
    fn test_intervals_feed_silence_map() {
        let log = "\
[silencedetect @ 0x55d] silence_start: 9.0
[silencedetect @ 0x55d] silence_end: 10.0 | silence_duration: 1.0
";
        let silences = parse_silencedetect_log(log);
        assert!(crate::detect::SilenceMap::new(silences).is_ok());
    }
}
