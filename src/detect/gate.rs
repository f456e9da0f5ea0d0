use std::time::Duration;

use tracing::debug;

use super::{CandidateAnchor, SilenceMap};

/// Keep only candidates bracketed by a qualifying narrator pause.
///
/// Genuine chapter announcements sit between silences; mid-sentence hits on
/// the trigger word do not. Back-matter candidates are exempt from the
/// post-silence bound because the trailing speech continues immediately.
pub fn apply_silence_gate(
    candidates: Vec<CandidateAnchor>,
    silences: &SilenceMap,
    required_pre: Duration,
    required_post: Duration,
) -> Vec<CandidateAnchor> {
    candidates
        .into_iter()
        .filter(|c| {
            let pre = silences.silent_run_ending_at(c.start);
            if pre < required_pre {
                debug!(
                    "Gate drop '{}' at {:.2}s: pre-silence {:.2}s < {:.2}s",
                    c.phrase,
                    c.start.as_secs_f64(),
                    pre.as_secs_f64(),
                    required_pre.as_secs_f64()
                );
                return false;
            }
            if !c.back_matter {
                let post = silences.silent_run_starting_at(c.end);
                if post < required_post {
                    debug!(
                        "Gate drop '{}' at {:.2}s: post-silence {:.2}s < {:.2}s",
                        c.phrase,
                        c.start.as_secs_f64(),
                        post.as_secs_f64(),
                        required_post.as_secs_f64()
                    );
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilenceInterval;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn map(intervals: &[(f64, f64)]) -> SilenceMap {
        SilenceMap::new(
            intervals
                .iter()
                .map(|&(s, e)| SilenceInterval {
                    start: secs(s),
                    end: secs(e),
                })
                .collect(),
        )
        .unwrap()
    }

    fn anchor(start: f64, end: f64, back_matter: bool) -> CandidateAnchor {
        CandidateAnchor {
            start: secs(start),
            end: secs(end),
            phrase: "chapter one".to_string(),
            number: Some(1),
            confidence: 0.9,
            back_matter,
        }
    }

    #[test]
    fn test_bracketed_candidate_passes() {
        let silences = map(&[(9.0, 10.0), (10.8, 11.8)]);
        let kept = apply_silence_gate(
            vec![anchor(10.0, 10.8, false)],
            &silences,
            secs(0.6),
            secs(0.8),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_insufficient_post_silence_rejected() {
        let silences = map(&[(9.0, 10.0), (10.8, 11.2)]);
        let kept = apply_silence_gate(
            vec![anchor(10.0, 10.8, false)],
            &silences,
            secs(0.6),
            secs(0.8),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_insufficient_pre_silence_rejected() {
        let silences = map(&[(9.7, 10.0), (10.8, 11.8)]);
        let kept = apply_silence_gate(
            vec![anchor(10.0, 10.8, false)],
            &silences,
            secs(0.6),
            secs(0.8),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_back_matter_exempt_from_post() {
        // No silence after the phrase at all
        let silences = map(&[(9.0, 10.0)]);
        let kept = apply_silence_gate(
            vec![anchor(10.0, 10.8, true)],
            &silences,
            secs(0.6),
            secs(0.8),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_back_matter_still_requires_pre() {
        let silences = map(&[(10.8, 11.8)]);
        let kept = apply_silence_gate(
            vec![anchor(10.0, 10.8, true)],
            &silences,
            secs(0.6),
            secs(0.8),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_empty_silence_map_rejects_everything() {
        let silences = map(&[]);
        let kept = apply_silence_gate(
            vec![anchor(10.0, 10.8, false)],
            &silences,
            secs(0.6),
            secs(0.8),
        );
        assert!(kept.is_empty());
    }
}
