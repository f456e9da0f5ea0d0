use std::collections::HashMap;

use tracing::debug;

use crate::error::{ChapterizeError, Result};
use crate::grammar::{Grammar, Phrase, PhraseKind};
use crate::recognize::RecognizedToken;

use super::CandidateAnchor;

/// Scan the recognized-token stream for trigger-phrase occurrences.
///
/// Greedy longest-match: at each position the longest vocabulary phrase
/// starting at that token wins, so "chapter one" beats bare "chapter".
/// Bare-trigger matches never produce an anchor. This stage over-generates
/// on purpose; the gate, confidence filter and validator refine later.
pub fn match_phrases(
    tokens: &[RecognizedToken],
    grammar: &Grammar,
) -> Result<Vec<CandidateAnchor>> {
    check_monotonic(tokens)?;

    // Phrases indexed by first word, longest first, so the linear scan
    // only ever compares against plausible continuations.
    let mut by_first: HashMap<&str, Vec<&Phrase>> = HashMap::new();
    for phrase in grammar.phrases() {
        if let Some(first) = phrase.words.first() {
            by_first.entry(first.as_str()).or_default().push(phrase);
        }
    }
    for phrases in by_first.values_mut() {
        phrases.sort_by_key(|p| std::cmp::Reverse(p.words.len()));
    }

    let mut anchors = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let word = tokens[i].word.to_lowercase();
        let matched = by_first
            .get(word.as_str())
            .and_then(|phrases| {
                phrases
                    .iter()
                    .find(|p| phrase_matches_at(tokens, i, p))
                    .copied()
            });

        let Some(phrase) = matched else {
            i += 1;
            continue;
        };

        let len = phrase.words.len();
        if phrase.kind != PhraseKind::BareTrigger {
            let span = &tokens[i..i + len];
            let confidence = weakest_link(span);
            let end = span
                .iter()
                .map(|t| t.end)
                .max()
                .unwrap_or(span[0].end);
            debug!(
                "Phrase '{}' at {:.2}s (conf {:.2})",
                phrase.text(),
                span[0].start.as_secs_f64(),
                confidence
            );
            anchors.push(CandidateAnchor {
                start: span[0].start,
                end,
                phrase: phrase.text(),
                number: phrase.number,
                confidence,
                back_matter: phrase.kind == PhraseKind::BackMatter,
            });
        }
        i += len;
    }

    Ok(anchors)
}

fn phrase_matches_at(tokens: &[RecognizedToken], at: usize, phrase: &Phrase) -> bool {
    if at + phrase.words.len() > tokens.len() {
        return false;
    }
    phrase
        .words
        .iter()
        .zip(&tokens[at..])
        .all(|(word, token)| token.word.to_lowercase() == *word)
}

/// A phrase is only as trustworthy as its least-confident word.
fn weakest_link(tokens: &[RecognizedToken]) -> f32 {
    tokens
        .iter()
        .map(|t| t.confidence)
        .fold(f32::INFINITY, f32::min)
}

fn check_monotonic(tokens: &[RecognizedToken]) -> Result<()> {
    for pair in tokens.windows(2) {
        if pair[1].start < pair[0].start {
            return Err(ChapterizeError::ContractViolation(format!(
                "token stream is not time-ordered: '{}' at {:?} follows '{}' at {:?}",
                pair[1].word, pair[1].start, pair[0].word, pair[0].start
            )));
        }
    }
    Ok(())
}
