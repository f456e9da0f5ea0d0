//! Chapter candidate detection and validation for audiobook recordings.
//!
//! The core engine in [`detect`] is pure: it turns recognized word tokens,
//! a silence map, and a phrase grammar into validated chapter boundaries.
//! The surrounding modules handle the external collaborators (ffmpeg for
//! audio work, a speech recognizer behind the [`recognize::Recognizer`]
//! trait) and drive the end-to-end [`pipeline`].

pub mod audio;
pub mod config;
pub mod detect;
pub mod error;
pub mod grammar;
pub mod pipeline;
pub mod recognize;
pub mod report;

pub use config::{Config, DetectionConfig, Language, SilenceDetectConfig};
pub use detect::{detect_chapters, ChapterBoundary, DetectionOutcome, ValidatedCandidate};
pub use error::{ChapterizeError, Result};
pub use grammar::{Grammar, GrammarBuilder, Phrase, PhraseKind};
pub use recognize::{RecognizedToken, Recognizer};
