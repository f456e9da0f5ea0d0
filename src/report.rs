// Chapters JSON report
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::detect::DetectionOutcome;
use crate::error::Result;

#[derive(Serialize)]
struct ReportOutput {
    metadata: ReportMetadata,
    boundaries: Vec<ReportBoundary>,
    candidates: Vec<ReportCandidate>,
}

#[derive(Serialize)]
struct ReportMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    total_duration: f64,
    boundary_count: usize,
    accepted_candidates: usize,
}

#[derive(Serialize)]
struct ReportBoundary {
    index: usize,
    label: String,
    start: f64,
    end: f64,
    start_formatted: String,
    duration: f64,
}

#[derive(Serialize)]
struct ReportCandidate {
    phrase: String,
    time: f64,
    confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<u32>,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<String>,
}

/// Render the detection outcome as a JSON report for diagnostics and
/// downstream tagging collaborators.
pub fn render_report(
    outcome: &DetectionOutcome,
    source: Option<&str>,
    total_duration: Duration,
) -> Result<String> {
    let output = ReportOutput {
        metadata: ReportMetadata {
            source: source.map(|s| s.to_string()),
            total_duration: total_duration.as_secs_f64(),
            boundary_count: outcome.boundaries.len(),
            accepted_candidates: outcome.stats.accepted,
        },
        boundaries: outcome
            .boundaries
            .iter()
            .map(|b| ReportBoundary {
                index: b.index,
                label: b.label.clone(),
                start: b.start.as_secs_f64(),
                end: b.end.as_secs_f64(),
                start_formatted: format_timestamp(b.start),
                duration: b.duration().as_secs_f64(),
            })
            .collect(),
        candidates: outcome
            .candidates
            .iter()
            .map(|c| ReportCandidate {
                phrase: c.anchor.phrase.clone(),
                time: c.anchor.start.as_secs_f64(),
                confidence: c.anchor.confidence,
                number: c.anchor.number,
                accepted: c.accepted,
                sequence_index: c.sequence_index,
                rejection: c.rejection.map(|r| r.to_string()),
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

/// Write the JSON report next to the exported chapters.
pub fn write_report(
    path: &Path,
    outcome: &DetectionOutcome,
    source: Option<&str>,
    total_duration: Duration,
) -> Result<()> {
    let content = render_report(outcome, source, total_duration)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn format_timestamp(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
