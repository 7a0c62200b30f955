//! Reply grammar for the quality and moderation prompts.
//!
//! Score: the first line containing `SCORE:`; the value sits between the first
//! `:` and the next `/`, is parsed as a float and clamped into `[0, 10]`.
//!
//! Moderation: a reply is inappropriate only if it contains the exact
//! substring `APPROPRIATE: NON`; the reason is the text between the first
//! `RAISON:` and the next one (or the end). Any other reply, including an
//! empty one, is appropriate.
//!
//! Neither function fails: malformed replies degrade to "no score" or
//! "appropriate".

use crate::results::{AppropriatenessResult, DEFAULT_INAPPROPRIATE_REASON};

pub const SCORE_MARKER: &str = "SCORE:";
pub const INAPPROPRIATE_MARKER: &str = "APPROPRIATE: NON";
pub const REASON_MARKER: &str = "RAISON:";

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Extract the numeric score from a quality reply.
///
/// ```
/// use quill_llm::parser::parse_score;
///
/// assert_eq!(parse_score("SCORE: 7.5/10\n\nBon article."), Some(7.5));
/// assert_eq!(parse_score("SCORE: 12/10"), Some(10.0));
/// assert_eq!(parse_score("Aucun score ici"), None);
/// ```
pub fn parse_score(feedback: &str) -> Option<f64> {
    let line = feedback.lines().find(|l| l.contains(SCORE_MARKER))?;
    let after_colon = line.split(':').nth(1)?;
    let value = after_colon.split('/').next()?.trim();
    let score: f64 = value.parse().ok()?;
    if score.is_nan() {
        return None;
    }
    Some(score.clamp(MIN_SCORE, MAX_SCORE))
}

/// Classify a moderation reply.
pub fn parse_appropriateness(reply: &str) -> AppropriatenessResult {
    if !reply.contains(INAPPROPRIATE_MARKER) {
        return AppropriatenessResult::appropriate();
    }
    // A present but blank reason stays blank; the default covers a missing marker.
    let reason = reply
        .split(REASON_MARKER)
        .nth(1)
        .map(str::trim)
        .unwrap_or(DEFAULT_INAPPROPRIATE_REASON);
    AppropriatenessResult::flagged(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_on_first_line() {
        assert_eq!(parse_score("SCORE: 7.5/10\n\nAnalyse..."), Some(7.5));
    }

    #[test]
    fn score_after_preamble_lines() {
        let reply = "Voici mon analyse.\n\nSCORE: 8/10\n\n1. Titre: correct";
        assert_eq!(parse_score(reply), Some(8.0));
    }

    #[test]
    fn score_uses_first_matching_line_only() {
        let reply = "SCORE: 4/10\nSCORE: 9/10";
        assert_eq!(parse_score(reply), Some(4.0));
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(parse_score("SCORE: 12/10"), Some(10.0));
        assert_eq!(parse_score("SCORE: -3/10"), Some(0.0));
        assert_eq!(parse_score("SCORE: 0/10"), Some(0.0));
        assert_eq!(parse_score("SCORE: 10/10"), Some(10.0));
    }

    #[test]
    fn score_without_slash_still_parses() {
        assert_eq!(parse_score("SCORE: 6.5"), Some(6.5));
    }

    #[test]
    fn missing_marker_gives_none() {
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("Score global: 7/10"), None);
    }

    #[test]
    fn confusing_delimiters_give_none() {
        assert_eq!(parse_score("SCORE: N/A"), None);
        assert_eq!(parse_score("**SCORE:** 8/10"), None);
        assert_eq!(parse_score("SCORE: 7:5/10"), Some(7.0));
        assert_eq!(parse_score("SCORE:"), None);
        assert_eq!(parse_score("SCORE: huit/10"), None);
    }

    #[test]
    fn nan_is_rejected_and_infinities_clamp() {
        assert_eq!(parse_score("SCORE: NaN/10"), None);
        assert_eq!(parse_score("SCORE: inf/10"), Some(10.0));
        assert_eq!(parse_score("SCORE: -inf/10"), Some(0.0));
    }

    #[test]
    fn crlf_lines_are_handled() {
        assert_eq!(parse_score("Intro\r\nSCORE: 9/10\r\nfin"), Some(9.0));
    }

    #[test]
    fn inappropriate_with_reason() {
        let r = parse_appropriateness("APPROPRIATE: NON\nRAISON:   Propos haineux envers un groupe.  ");
        assert!(!r.appropriate);
        assert_eq!(r.reason.as_deref(), Some("Propos haineux envers un groupe."));
    }

    #[test]
    fn missing_reason_marker_uses_default() {
        let r = parse_appropriateness("APPROPRIATE: NON");
        assert!(!r.appropriate);
        assert_eq!(r.reason.as_deref(), Some(DEFAULT_INAPPROPRIATE_REASON));
    }

    #[test]
    fn blank_reason_stays_blank() {
        let r = parse_appropriateness("APPROPRIATE: NON\nRAISON:   ");
        assert!(!r.appropriate);
        assert_eq!(r.reason.as_deref(), Some(""));
    }

    #[test]
    fn reason_stops_at_next_marker() {
        let r = parse_appropriateness("APPROPRIATE: NON\nRAISON: spam\nsuite RAISON: bis");
        assert_eq!(r.reason.as_deref(), Some("spam\nsuite"));
    }

    #[test]
    fn appropriate_replies_have_no_reason() {
        for reply in ["APPROPRIATE: OUI", "", "n'importe quoi", "appropriate: non"] {
            let r = parse_appropriateness(reply);
            assert!(r.appropriate, "reply {reply:?}");
            assert!(r.reason.is_none());
        }
    }

    #[test]
    fn marker_match_is_substring_based() {
        let r = parse_appropriateness("Je ne dirais pas APPROPRIATE: NON ici, tout va bien.");
        assert!(!r.appropriate);
    }
}
