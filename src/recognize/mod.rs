pub mod token_file;

pub use token_file::{check_analysis_wav, TokenFile};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::grammar::Grammar;

/// One word the external recognizer heard, with timing and confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedToken {
    pub word: String,
    pub start: Duration,
    pub end: Duration,
    pub confidence: f32,
}

/// The external phrase-constrained recognition engine.
///
/// Implementations run (or load the output of) a recognizer restricted to
/// the grammar's vocabulary and return the full time-ordered token stream
/// for the analysis audio.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, audio: &Path, grammar: &Grammar) -> Result<Vec<RecognizedToken>>;

    fn name(&self) -> &'static str;
}
