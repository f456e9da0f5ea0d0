pub mod numerals;

pub use numerals::{lexicon_for, NumeralLexicon};

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{DetectionConfig, Language};
use crate::error::{ChapterizeError, Result};

/// What a matched phrase means to the detection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseKind {
    /// "chapter twelve" / "twelfth chapter" style announcement.
    Chapter,
    /// User-supplied phrase with no inferred number.
    Custom,
    /// Marks the start of back matter.
    BackMatter,
    /// The trigger word alone. Present in the vocabulary so the recognizer
    /// can hear it, but never actionable: bare-trigger hits are false
    /// positives.
    BareTrigger,
}

/// One phrase in the recognition vocabulary.
#[derive(Debug, Clone)]
pub struct Phrase {
    /// Lowercased constituent words, in order.
    pub words: Vec<String>,
    /// Chapter number this phrase announces, if any.
    pub number: Option<u32>,
    pub kind: PhraseKind,
}

impl Phrase {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// The frozen phrase vocabulary handed to the external recognizer.
///
/// Built once per run before recognition starts; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub language: Language,
    pub trigger: String,
    phrases: Vec<Phrase>,
}

impl Grammar {
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    /// Phrase strings for the recognizer's constrained vocabulary.
    pub fn vocabulary(&self) -> Vec<String> {
        self.phrases.iter().map(|p| p.text()).collect()
    }

    /// The vocabulary as the JSON array a Vosk-style recognizer accepts.
    pub fn vocabulary_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.vocabulary())?)
    }
}

/// Builds the frozen [`Grammar`] from the configuration surface.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    language: Language,
    trigger: Option<String>,
    max_chapters: usize,
    include_ordinals: bool,
    phrases_file: Option<PathBuf>,
    back_trigger: Option<String>,
}

impl GrammarBuilder {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            trigger: None,
            max_chapters: 120,
            include_ordinals: false,
            phrases_file: None,
            back_trigger: None,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            language: config.language,
            trigger: config.trigger.clone(),
            max_chapters: config.max_chapters,
            include_ordinals: config.include_ordinals,
            phrases_file: config.phrases_file.clone(),
            back_trigger: config.back_trigger.clone(),
        }
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn max_chapters(mut self, max: usize) -> Self {
        self.max_chapters = max;
        self
    }

    pub fn include_ordinals(mut self, include: bool) -> Self {
        self.include_ordinals = include;
        self
    }

    pub fn phrases_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.phrases_file = Some(path.into());
        self
    }

    pub fn back_trigger(mut self, phrase: impl Into<String>) -> Self {
        self.back_trigger = Some(phrase.into());
        self
    }

    pub fn build(self) -> Result<Grammar> {
        let trigger = self
            .trigger
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.language.default_trigger().to_string());

        let lexicon = lexicon_for(self.language);
        let mut phrases = Vec::new();

        for n in 1..=self.max_chapters as u32 {
            let spoken = lexicon.cardinal(n);
            let mut words = vec![trigger.clone()];
            words.extend(split_words(&spoken));
            phrases.push(Phrase {
                words,
                number: Some(n),
                kind: PhraseKind::Chapter,
            });

            if self.include_ordinals {
                if let Some(ordinal) = lexicon.ordinal(n) {
                    let mut words = split_words(&ordinal);
                    words.push(trigger.clone());
                    phrases.push(Phrase {
                        words,
                        number: Some(n),
                        kind: PhraseKind::Chapter,
                    });
                }
            }
        }

        if let Some(path) = &self.phrases_file {
            let custom = load_custom_phrases(path)?;
            info!(
                "Loaded {} custom phrases from {}",
                custom.len(),
                path.display()
            );
            // A custom line equal to the trigger would make the lone
            // trigger word actionable; only the non-actionable bare-trigger
            // entry may carry it.
            for phrase in custom {
                if phrase.words.len() == 1 && phrase.words[0] == trigger {
                    debug!("Skipping custom phrase equal to trigger '{}'", trigger);
                    continue;
                }
                phrases.push(phrase);
            }
        }

        // Bare trigger stays in the vocabulary so the recognizer does not
        // force-fit a number onto a lone announcement word.
        phrases.push(Phrase {
            words: vec![trigger.clone()],
            number: None,
            kind: PhraseKind::BareTrigger,
        });

        if let Some(back) = &self.back_trigger {
            let words = split_words(&back.to_lowercase());
            if !words.is_empty() {
                phrases.push(Phrase {
                    words,
                    number: None,
                    kind: PhraseKind::BackMatter,
                });
            }
        }

        debug!(
            "Grammar: {} phrases, trigger '{}', language {}",
            phrases.len(),
            trigger,
            self.language
        );

        Ok(Grammar {
            language: self.language,
            trigger,
            phrases,
        })
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(|w| w.to_string()).collect()
}

fn load_custom_phrases(path: &PathBuf) -> Result<Vec<Phrase>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ChapterizeError::Config(format!(
            "Cannot read phrases file {}: {e}",
            path.display()
        ))
    })?;

    let mut seen = std::collections::HashSet::new();
    let mut phrases = Vec::new();
    for line in contents.lines() {
        let line = line.trim().to_lowercase();
        if line.is_empty() || !seen.insert(line.clone()) {
            continue;
        }
        phrases.push(Phrase {
            words: split_words(&line),
            number: None,
            kind: PhraseKind::Custom,
        });
    }

    if phrases.is_empty() {
        return Err(ChapterizeError::Config(format!(
            "Phrases file {} contains no phrases",
            path.display()
        )));
    }

    Ok(phrases)
}
