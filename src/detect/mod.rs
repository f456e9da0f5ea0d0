pub mod boundary;
pub mod gate;
pub mod matcher;
pub mod silence;
pub mod validator;

pub use boundary::{resolve_boundaries, ChapterBoundary};
pub use gate::apply_silence_gate;
pub use matcher::match_phrases;
pub use silence::SilenceMap;
pub use validator::{retain_confident, validate, RejectionReason};

use std::time::Duration;

use tracing::info;

use crate::audio::SilenceInterval;
use crate::config::DetectionConfig;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::recognize::RecognizedToken;

/// A raw trigger-phrase occurrence emitted by the matcher.
///
/// Duplicates and false positives are expected here; the gate, confidence
/// filter and validator refine the set.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAnchor {
    /// Start time of the phrase's first token.
    pub start: Duration,
    /// End time of the phrase's last token.
    pub end: Duration,
    pub phrase: String,
    pub number: Option<u32>,
    /// Minimum confidence across constituent tokens.
    pub confidence: f32,
    pub back_matter: bool,
}

/// A candidate with its final validation verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCandidate {
    pub anchor: CandidateAnchor,
    /// 1-based position among accepted candidates; `None` when rejected.
    pub sequence_index: Option<usize>,
    pub accepted: bool,
    pub rejection: Option<RejectionReason>,
}

/// Stage counts for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionStats {
    pub raw_anchors: usize,
    pub after_gate: usize,
    pub after_confidence: usize,
    pub accepted: usize,
}

/// Everything one detection run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub boundaries: Vec<ChapterBoundary>,
    /// Verdicts for every candidate that reached the validator.
    pub candidates: Vec<ValidatedCandidate>,
    pub stats: DetectionStats,
}

/// Run the full detection engine: a pure function from (tokens, silences,
/// grammar, configuration, duration) to the final chapter timeline.
///
/// No I/O, no shared state between runs; identical inputs give identical
/// output.
pub fn detect_chapters(
    tokens: &[RecognizedToken],
    silences: &[SilenceInterval],
    grammar: &Grammar,
    config: &DetectionConfig,
    total_duration: Duration,
) -> Result<DetectionOutcome> {
    let silence_map = SilenceMap::new(silences.to_vec())?;

    let anchors = match_phrases(tokens, grammar)?;
    let raw_anchors = anchors.len();

    let gated = apply_silence_gate(
        anchors,
        &silence_map,
        config.silence_pre,
        config.silence_post,
    );
    let after_gate = gated.len();

    let confident = retain_confident(gated, config.conf_min);
    let after_confidence = confident.len();

    let candidates = validate(confident, config, total_duration);
    let accepted = candidates.iter().filter(|c| c.accepted).count();

    let boundaries = resolve_boundaries(&candidates, total_duration);

    info!(
        "Detection: {} anchors, {} after gate, {} after confidence, {} accepted, {} boundaries",
        raw_anchors,
        after_gate,
        after_confidence,
        accepted,
        boundaries.len()
    );

    Ok(DetectionOutcome {
        boundaries,
        candidates,
        stats: DetectionStats {
            raw_anchors,
            after_gate,
            after_confidence,
            accepted,
        },
    })
}
