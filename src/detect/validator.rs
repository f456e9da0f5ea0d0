use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::DetectionConfig;

use super::{CandidateAnchor, ValidatedCandidate};

/// Why the validator turned a candidate down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Closer to the previous accepted mark than the minimum gap.
    TooClose,
    /// The resulting chapter would be shorter than the minimum duration.
    TooShort,
    /// Sequential enforcement expected a different chapter number.
    SequenceMismatch { expected: u32, got: u32 },
    /// This chapter number was already accepted (re-announcement).
    DuplicateNumber,
    /// The maximum chapter count was already reached.
    OverMaxChapters,
    /// Back matter already started; chapter detection is over.
    AfterBackMatter,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::TooClose => write!(f, "too close to previous chapter"),
            RejectionReason::TooShort => write!(f, "resulting chapter too short"),
            RejectionReason::SequenceMismatch { expected, got } => {
                write!(f, "expected chapter {}, got {}", expected, got)
            }
            RejectionReason::DuplicateNumber => {
                write!(f, "chapter number already accepted")
            }
            RejectionReason::OverMaxChapters => write!(f, "over maximum chapter count"),
            RejectionReason::AfterBackMatter => write!(f, "after back matter started"),
        }
    }
}

/// Confidence Filter: drop candidates the recognizer was not sure about.
/// Pure, stateless, order-preserving.
pub fn retain_confident(candidates: Vec<CandidateAnchor>, conf_min: f32) -> Vec<CandidateAnchor> {
    candidates
        .into_iter()
        .filter(|c| c.confidence >= conf_min)
        .collect()
}

struct ValidatorState {
    last_accepted: Option<Duration>,
    last_number: u32,
    seen_numbers: HashSet<u32>,
    accepted_count: usize,
    back_matter_seen: bool,
}

/// Run the stateful validation fold over time-ordered candidates.
///
/// Every candidate comes back with a verdict; rejections carry a reason for
/// diagnostic reporting and are never errors. Two passes: the forward fold
/// enforces gap, count, numbering and back-matter cutoff; the second pass
/// removes accepted marks whose chapter would come out shorter than the
/// minimum (their audio merges forward into the neighbor). The duration of
/// a chapter depends on the *next* boundary, which is why the forward fold
/// alone cannot decide it.
pub fn validate(
    candidates: Vec<CandidateAnchor>,
    config: &DetectionConfig,
    total_duration: Duration,
) -> Vec<ValidatedCandidate> {
    let mut verdicts = forward_pass(candidates, config);
    duration_pass(&mut verdicts, config, total_duration);
    assign_sequence_indices(&mut verdicts);
    verdicts
}

fn forward_pass(
    candidates: Vec<CandidateAnchor>,
    config: &DetectionConfig,
) -> Vec<ValidatedCandidate> {
    let mut state = ValidatorState {
        last_accepted: None,
        last_number: 0,
        seen_numbers: HashSet::new(),
        accepted_count: 0,
        back_matter_seen: false,
    };

    candidates
        .into_iter()
        .map(|anchor| {
            let verdict = evaluate(&anchor, &mut state, config);
            match verdict {
                Ok(()) => ValidatedCandidate {
                    anchor,
                    sequence_index: None,
                    accepted: true,
                    rejection: None,
                },
                Err(reason) => {
                    debug!(
                        "Reject '{}' at {:.2}s: {}",
                        anchor.phrase,
                        anchor.start.as_secs_f64(),
                        reason
                    );
                    ValidatedCandidate {
                        anchor,
                        sequence_index: None,
                        accepted: false,
                        rejection: Some(reason),
                    }
                }
            }
        })
        .collect()
}

fn evaluate(
    anchor: &CandidateAnchor,
    state: &mut ValidatorState,
    config: &DetectionConfig,
) -> std::result::Result<(), RejectionReason> {
    if state.back_matter_seen {
        // Back matter terminates detection; only the first back trigger counts.
        return Err(RejectionReason::AfterBackMatter);
    }

    let gap_ok = match state.last_accepted {
        Some(last) => anchor.start.saturating_sub(last) >= config.min_chapter_gap,
        None => true,
    };

    if anchor.back_matter {
        if !gap_ok {
            return Err(RejectionReason::TooClose);
        }
        state.back_matter_seen = true;
        state.last_accepted = Some(anchor.start);
        // Back matter does not count against max_chapters
        return Ok(());
    }

    if !gap_ok {
        return Err(RejectionReason::TooClose);
    }
    if state.accepted_count >= config.max_chapters {
        return Err(RejectionReason::OverMaxChapters);
    }
    if config.sequential {
        if let Some(number) = anchor.number {
            let expected = state.last_number + 1;
            if number != expected {
                return Err(RejectionReason::SequenceMismatch {
                    expected,
                    got: number,
                });
            }
        }
        // Numberless custom phrases are exempt and do not advance the
        // expected-next counter.
    } else if let Some(number) = anchor.number {
        // Without sequential enforcement, a re-announced number still must
        // not split the book into two chapters with the same label.
        if state.seen_numbers.contains(&number) {
            return Err(RejectionReason::DuplicateNumber);
        }
    }

    state.last_accepted = Some(anchor.start);
    if let Some(number) = anchor.number {
        state.last_number = number;
        state.seen_numbers.insert(number);
    }
    state.accepted_count += 1;
    Ok(())
}

/// Backward-looking correction: drop accepted chapters whose span to the
/// next accepted mark (or end of audio) falls short of the minimum, then
/// re-check the gap rule against the surviving predecessor.
fn duration_pass(
    verdicts: &mut [ValidatedCandidate],
    config: &DetectionConfig,
    total_duration: Duration,
) {
    let accepted: Vec<usize> = verdicts
        .iter()
        .enumerate()
        .filter(|(_, v)| v.accepted)
        .map(|(i, _)| i)
        .collect();

    let mut last_kept_start: Option<Duration> = None;
    for (pos, &idx) in accepted.iter().enumerate() {
        let start = verdicts[idx].anchor.start;

        if !verdicts[idx].anchor.back_matter {
            let end = accepted
                .get(pos + 1)
                .map(|&next| verdicts[next].anchor.start)
                .unwrap_or(total_duration);
            if end.saturating_sub(start) < config.min_chapter_duration {
                verdicts[idx].accepted = false;
                verdicts[idx].rejection = Some(RejectionReason::TooShort);
                continue;
            }
        }

        if let Some(last) = last_kept_start {
            if start.saturating_sub(last) < config.min_chapter_gap {
                verdicts[idx].accepted = false;
                verdicts[idx].rejection = Some(RejectionReason::TooClose);
                continue;
            }
        }

        last_kept_start = Some(start);
    }
}

fn assign_sequence_indices(verdicts: &mut [ValidatedCandidate]) {
    let mut next = 1;
    for v in verdicts.iter_mut() {
        if v.accepted {
            v.sequence_index = Some(next);
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn anchor(start: f64, number: Option<u32>) -> CandidateAnchor {
        CandidateAnchor {
            start: secs(start),
            end: secs(start + 0.8),
            phrase: match number {
                Some(n) => format!("chapter {}", n),
                None => "prologue".to_string(),
            },
            number,
            confidence: 0.9,
            back_matter: false,
        }
    }

    fn back(start: f64) -> CandidateAnchor {
        CandidateAnchor {
            start: secs(start),
            end: secs(start + 1.5),
            phrase: "this concludes the reading".to_string(),
            number: None,
            confidence: 0.9,
            back_matter: true,
        }
    }

    fn config() -> DetectionConfig {
        DetectionConfig {
            min_chapter_gap: secs(90.0),
            min_chapter_duration: secs(120.0),
            max_chapters: 120,
            sequential: false,
            ..Default::default()
        }
    }

    fn accepted(verdicts: &[ValidatedCandidate]) -> Vec<&ValidatedCandidate> {
        verdicts.iter().filter(|v| v.accepted).collect()
    }

    #[test]
    fn test_retain_confident() {
        let kept = retain_confident(
            vec![
                CandidateAnchor {
                    confidence: 0.2,
                    ..anchor(10.0, Some(1))
                },
                anchor(200.0, Some(2)),
            ],
            0.35,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].number, Some(2));
    }

    #[test]
    fn test_gap_debounce() {
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), anchor(130.0, Some(2))],
            &config(),
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert!(!verdicts[1].accepted);
        assert_eq!(verdicts[1].rejection, Some(RejectionReason::TooClose));
    }

    #[test]
    fn test_sequence_indices_assigned_in_order() {
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), anchor(300.0, Some(2))],
            &config(),
            secs(1000.0),
        );

        assert_eq!(verdicts[0].sequence_index, Some(1));
        assert_eq!(verdicts[1].sequence_index, Some(2));
    }

    #[test]
    fn test_repeated_number_rejected_when_not_sequential() {
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), anchor(300.0, Some(1))],
            &config(),
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert_eq!(
            verdicts[1].rejection,
            Some(RejectionReason::DuplicateNumber)
        );
        assert_eq!(accepted(&verdicts).len(), 1);
    }

    #[test]
    fn test_max_chapters() {
        let cfg = DetectionConfig {
            max_chapters: 1,
            ..config()
        };
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), anchor(300.0, Some(2))],
            &cfg,
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert_eq!(
            verdicts[1].rejection,
            Some(RejectionReason::OverMaxChapters)
        );
    }

    #[test]
    fn test_sequential_skip_rejected() {
        let cfg = DetectionConfig {
            sequential: true,
            ..config()
        };
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), anchor(250.0, Some(3))],
            &cfg,
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert_eq!(
            verdicts[1].rejection,
            Some(RejectionReason::SequenceMismatch {
                expected: 2,
                got: 3
            })
        );
        assert_eq!(accepted(&verdicts).len(), 1);
    }

    #[test]
    fn test_sequential_must_start_at_one() {
        let cfg = DetectionConfig {
            sequential: true,
            ..config()
        };
        let verdicts = validate(vec![anchor(100.0, Some(4))], &cfg, secs(1000.0));

        assert_eq!(
            verdicts[0].rejection,
            Some(RejectionReason::SequenceMismatch {
                expected: 1,
                got: 4
            })
        );
    }

    #[test]
    fn test_custom_phrase_exempt_from_sequence() {
        let cfg = DetectionConfig {
            sequential: true,
            ..config()
        };
        let verdicts = validate(
            vec![
                anchor(100.0, Some(1)),
                anchor(300.0, None),
                anchor(500.0, Some(2)),
            ],
            &cfg,
            secs(1000.0),
        );

        // Numberless phrase accepted, and chapter 2 still expected next
        assert!(verdicts.iter().all(|v| v.accepted));
    }

    #[test]
    fn test_back_matter_cutoff() {
        let verdicts = validate(
            vec![
                anchor(100.0, Some(1)),
                back(400.0),
                anchor(600.0, Some(2)),
            ],
            &config(),
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert!(verdicts[1].accepted);
        assert_eq!(
            verdicts[2].rejection,
            Some(RejectionReason::AfterBackMatter)
        );
    }

    #[test]
    fn test_second_back_matter_rejected() {
        let verdicts = validate(
            vec![back(400.0), back(600.0)],
            &config(),
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert_eq!(
            verdicts[1].rejection,
            Some(RejectionReason::AfterBackMatter)
        );
    }

    #[test]
    fn test_back_matter_not_counted_against_max() {
        let cfg = DetectionConfig {
            max_chapters: 1,
            ..config()
        };
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), back(400.0)],
            &cfg,
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert!(verdicts[1].accepted);
    }

    #[test]
    fn test_short_chapter_merged_forward() {
        // Chapter 2 spans only 60s before chapter 3; it gets dropped
        let verdicts = validate(
            vec![
                anchor(100.0, Some(1)),
                anchor(400.0, Some(2)),
                anchor(460.0, Some(3)),
            ],
            &DetectionConfig {
                min_chapter_gap: secs(10.0),
                ..config()
            },
            secs(1000.0),
        );

        assert!(verdicts[0].accepted);
        assert_eq!(verdicts[1].rejection, Some(RejectionReason::TooShort));
        assert!(verdicts[2].accepted);
        // Indices renumbered after the merge
        assert_eq!(verdicts[2].sequence_index, Some(2));
    }

    #[test]
    fn test_short_final_chapter_dropped() {
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), anchor(900.0, Some(2))],
            &config(),
            secs(950.0),
        );

        assert!(verdicts[0].accepted);
        assert_eq!(verdicts[1].rejection, Some(RejectionReason::TooShort));
    }

    #[test]
    fn test_back_matter_exempt_from_duration() {
        let verdicts = validate(
            vec![anchor(100.0, Some(1)), back(980.0)],
            &config(),
            secs(1000.0),
        );

        assert!(verdicts[1].accepted);
    }

    #[test]
    fn test_empty_input() {
        let verdicts = validate(vec![], &config(), secs(1000.0));
        assert!(verdicts.is_empty());
    }
}
