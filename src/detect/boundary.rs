use std::time::Duration;

use super::ValidatedCandidate;

/// One segment of the final chapter timeline.
///
/// Boundaries tile `[0, total]` exactly: each boundary ends where the next
/// one starts and the last ends at the total audio duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBoundary {
    pub index: usize,
    pub label: String,
    pub start: Duration,
    pub end: Duration,
}

impl ChapterBoundary {
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// `NN_label` stem suitable for output filenames.
    pub fn file_stem(&self) -> String {
        format!("{:02}_{}", self.index, self.label)
    }
}

/// Convert the accepted candidate sequence into the final chapter timeline.
///
/// The preface boundary is always present, even when zero-length, so
/// downstream collaborators can decide for themselves whether to emit it.
pub fn resolve_boundaries(
    candidates: &[ValidatedCandidate],
    total_duration: Duration,
) -> Vec<ChapterBoundary> {
    let accepted: Vec<&ValidatedCandidate> =
        candidates.iter().filter(|c| c.accepted).collect();

    let mut boundaries = Vec::with_capacity(accepted.len() + 1);

    let first_start = accepted
        .first()
        .map(|c| c.anchor.start)
        .unwrap_or(total_duration);
    boundaries.push(ChapterBoundary {
        index: 0,
        label: "preface".to_string(),
        start: Duration::ZERO,
        end: first_start,
    });

    let mut chapter_no = 0u32;
    for (i, candidate) in accepted.iter().enumerate() {
        let end = accepted
            .get(i + 1)
            .map(|next| next.anchor.start)
            .unwrap_or(total_duration);

        let label = if candidate.anchor.back_matter {
            "back_matter".to_string()
        } else {
            chapter_no += 1;
            format!("chapter_{}", candidate.anchor.number.unwrap_or(chapter_no))
        };

        boundaries.push(ChapterBoundary {
            index: i + 1,
            label,
            start: candidate.anchor.start,
            end,
        });
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::CandidateAnchor;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn accepted(start: f64, number: Option<u32>, back_matter: bool) -> ValidatedCandidate {
        ValidatedCandidate {
            anchor: CandidateAnchor {
                start: secs(start),
                end: secs(start + 0.8),
                phrase: "chapter".to_string(),
                number,
                confidence: 0.9,
                back_matter,
            },
            sequence_index: Some(1),
            accepted: true,
            rejection: None,
        }
    }

    #[test]
    fn test_no_candidates_yields_single_preface() {
        let boundaries = resolve_boundaries(&[], secs(3600.0));

        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].label, "preface");
        assert_eq!(boundaries[0].start, Duration::ZERO);
        assert_eq!(boundaries[0].end, secs(3600.0));
    }

    #[test]
    fn test_preface_always_present_even_zero_length() {
        let boundaries =
            resolve_boundaries(&[accepted(0.0, Some(1), false)], secs(600.0));

        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].label, "preface");
        assert_eq!(boundaries[0].duration(), Duration::ZERO);
        assert_eq!(boundaries[1].label, "chapter_1");
    }

    #[test]
    fn test_boundaries_tile_total_duration() {
        let candidates = vec![
            accepted(100.0, Some(1), false),
            accepted(400.0, Some(2), false),
            accepted(900.0, None, true),
        ];
        let total = secs(1200.0);
        let boundaries = resolve_boundaries(&candidates, total);

        assert_eq!(boundaries.len(), 4);
        assert_eq!(boundaries[0].start, Duration::ZERO);
        for pair in boundaries.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(boundaries.last().unwrap().end, total);
    }

    #[test]
    fn test_back_matter_label() {
        let candidates = vec![
            accepted(100.0, Some(1), false),
            accepted(900.0, None, true),
        ];
        let boundaries = resolve_boundaries(&candidates, secs(1200.0));

        assert_eq!(boundaries[2].label, "back_matter");
        assert_eq!(boundaries[2].end, secs(1200.0));
    }

    #[test]
    fn test_numberless_candidate_labeled_by_position() {
        let candidates = vec![
            accepted(100.0, None, false),
            accepted(400.0, Some(7), false),
        ];
        let boundaries = resolve_boundaries(&candidates, secs(1200.0));

        assert_eq!(boundaries[1].label, "chapter_1");
        assert_eq!(boundaries[2].label, "chapter_7");
    }

    #[test]
    fn test_file_stem() {
        let boundary = ChapterBoundary {
            index: 3,
            label: "chapter_3".to_string(),
            start: Duration::ZERO,
            end: secs(10.0),
        };
        assert_eq!(boundary.file_stem(), "03_chapter_3");
    }

    #[test]
    fn test_rejected_candidates_ignored() {
        let mut rejected = accepted(100.0, Some(1), false);
        rejected.accepted = false;

        let boundaries = resolve_boundaries(&[rejected], secs(600.0));
        assert_eq!(boundaries.len(), 1);
    }
}
