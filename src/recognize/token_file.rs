use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use hound::WavReader;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ChapterizeError, Result};
use crate::grammar::Grammar;

use super::{RecognizedToken, Recognizer};

/// Word entry in a Vosk-style recognizer dump.
#[derive(Debug, Deserialize)]
struct WireWord {
    word: String,
    start: f64,
    end: f64,
    #[serde(default = "default_conf")]
    conf: f64,
}

fn default_conf() -> f64 {
    1.0
}

/// One recognizer result object (the `{"text": ..., "result": [...]}` shape
/// a streaming run writes per utterance).
#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    result: Vec<WireWord>,
}

/// Recognizer backed by a token dump file from an external recognition run.
///
/// Accepts either a single JSON array of word objects or newline-delimited
/// per-utterance result objects.
pub struct TokenFile {
    path: PathBuf,
    expected_sample_rate: u32,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>, expected_sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            expected_sample_rate,
        }
    }

    fn load(&self) -> Result<Vec<RecognizedToken>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            ChapterizeError::Recognition(format!(
                "Cannot read token dump {}: {e}",
                self.path.display()
            ))
        })?;

        let words = parse_token_dump(&contents)?;
        debug!("Loaded {} tokens from {}", words.len(), self.path.display());
        Ok(words)
    }
}

fn parse_token_dump(contents: &str) -> Result<Vec<RecognizedToken>> {
    // Whole-file array first, then the newline-delimited utterance form.
    if let Ok(words) = serde_json::from_str::<Vec<WireWord>>(contents) {
        return Ok(words.into_iter().map(into_token).collect());
    }

    let mut tokens = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result: WireResult = serde_json::from_str(line).map_err(|e| {
            ChapterizeError::Recognition(format!(
                "Malformed token dump at line {}: {e}",
                line_no + 1
            ))
        })?;
        tokens.extend(result.result.into_iter().map(into_token));
    }
    Ok(tokens)
}

fn into_token(w: WireWord) -> RecognizedToken {
    RecognizedToken {
        word: w.word,
        start: Duration::from_secs_f64(w.start.max(0.0)),
        end: Duration::from_secs_f64(w.end.max(w.start.max(0.0))),
        confidence: w.conf as f32,
    }
}

/// Verify the analysis WAV is what the recognizer was run against:
/// mono at the expected sample rate.
pub fn check_analysis_wav(path: &Path, expected_sample_rate: u32) -> Result<()> {
    let reader = WavReader::open(path).map_err(|e| {
        ChapterizeError::Audio(format!(
            "Cannot open analysis WAV {}: {e}",
            path.display()
        ))
    })?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != expected_sample_rate {
        return Err(ChapterizeError::Audio(format!(
            "Analysis WAV format mismatch: got {} ch @ {} Hz, expected mono @ {} Hz",
            spec.channels, spec.sample_rate, expected_sample_rate
        )));
    }
    Ok(())
}

#[async_trait]
impl Recognizer for TokenFile {
    async fn recognize(&self, audio: &Path, _grammar: &Grammar) -> Result<Vec<RecognizedToken>> {
        if audio.exists() {
            check_analysis_wav(audio, self.expected_sample_rate)?;
        }

        let tokens = self.load()?;
        info!(
            "Token dump: {} recognized words from {}",
            tokens.len(),
            self.path.display()
        );
        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "token-file"
    }
}
