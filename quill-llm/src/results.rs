use crate::traits::CompletionError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INAPPROPRIATE_REASON: &str = "Contenu inapproprié détecté";
pub const SUGGESTIONS_UNAVAILABLE: &str = "Impossible de générer des suggestions pour le moment.";

/// Outcome of a quality check. `checked` always equals `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub score: Option<f64>,
    pub feedback: String,
    pub checked: bool,
    pub success: bool,
}

impl VerificationResult {
    /// The provider answered; `score` is `None` when the reply had no usable `SCORE:` line.
    pub fn scored(score: Option<f64>, feedback: String) -> Self {
        Self {
            score,
            feedback,
            checked: true,
            success: true,
        }
    }

    pub fn failed(err: &CompletionError) -> Self {
        Self {
            score: None,
            feedback: format!("Erreur lors de la vérification: {err}"),
            checked: false,
            success: false,
        }
    }
}

/// Moderation verdict. `reason` is only set when `appropriate` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppropriatenessResult {
    pub appropriate: bool,
    pub reason: Option<String>,
}

impl AppropriatenessResult {
    pub fn appropriate() -> Self {
        Self {
            appropriate: true,
            reason: None,
        }
    }

    pub fn flagged(reason: impl Into<String>) -> Self {
        Self {
            appropriate: false,
            reason: Some(reason.into()),
        }
    }

    /// Verdict used when the moderation call itself failed: publishing stays available.
    pub fn fail_open() -> Self {
        Self::appropriate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub suggestions: String,
    pub success: bool,
}

impl SuggestionResult {
    pub fn generated(suggestions: String) -> Self {
        Self {
            suggestions,
            success: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            suggestions: SUGGESTIONS_UNAVAILABLE.to_string(),
            success: false,
        }
    }
}
