//! Prompt templates for the three content tasks.
//!
//! The reply grammar the parser expects (`SCORE:`, `APPROPRIATE: OUI/NON`,
//! `RAISON:`) is spelled out inside these templates, so both modules must
//! change together.

/// Characters of article body kept for the quality prompt.
pub const QUALITY_CONTENT_CHARS: usize = 2000;
/// Characters of article body kept for moderation and suggestion prompts.
pub const SHORT_CONTENT_CHARS: usize = 1500;

pub const QUALITY_SYSTEM_ROLE: &str =
    "Tu es un expert en rédaction web et SEO qui analyse la qualité du contenu.";
pub const MODERATION_SYSTEM_ROLE: &str =
    "Tu es un modérateur de contenu qui vérifie la conformité éthique.";
pub const COACH_SYSTEM_ROLE: &str =
    "Tu es un expert en rédaction web qui donne des conseils pratiques.";

/// Focus area for improvement suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuggestionAspect {
    Seo,
    Style,
    Structure,
    #[default]
    General,
}

impl SuggestionAspect {
    /// Unrecognized names fall back to [`SuggestionAspect::General`].
    ///
    /// ```
    /// use quill_llm::prompts::SuggestionAspect;
    ///
    /// assert_eq!(SuggestionAspect::from_name("seo"), SuggestionAspect::Seo);
    /// assert_eq!(SuggestionAspect::from_name("unknown"), SuggestionAspect::General);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "seo" => SuggestionAspect::Seo,
            "style" => SuggestionAspect::Style,
            "structure" => SuggestionAspect::Structure,
            _ => SuggestionAspect::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionAspect::Seo => "seo",
            SuggestionAspect::Style => "style",
            SuggestionAspect::Structure => "structure",
            SuggestionAspect::General => "general",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            SuggestionAspect::Seo => {
                "Suggère des améliorations SEO pour ce contenu (mots-clés, structure, meta-description)"
            }
            SuggestionAspect::Style => {
                "Suggère des améliorations de style et d'écriture pour ce contenu"
            }
            SuggestionAspect::Structure => {
                "Suggère des améliorations de structure et d'organisation pour ce contenu"
            }
            SuggestionAspect::General => "Suggère des améliorations générales pour ce contenu",
        }
    }
}

/// First `max_chars` characters of `text`. Counts chars, not bytes, and may cut mid-word.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_quality_prompt(title: &str, content: &str, excerpt: &str) -> String {
    let body = truncate_chars(content, QUALITY_CONTENT_CHARS);
    format!(
        r#"Analyse la qualité du contenu suivant et donne un score sur 10 avec des recommandations détaillées.

Titre: {title}
Extrait: {excerpt}
Contenu: {body}...

Évalue les aspects suivants:
1. Qualité du titre (clarté, attractivité, SEO)
2. Structure et lisibilité du contenu
3. Pertinence et valeur informative
4. Grammaire et orthographe
5. Optimisation SEO (mots-clés, structure)
6. Engagement et style d'écriture

Donne un score global sur 10 et des recommandations spécifiques pour améliorer chaque aspect.
Format de réponse:
SCORE: [score]/10

[Analyse détaillée avec recommandations]
"#
    )
}

pub fn build_appropriateness_prompt(content: &str) -> String {
    let body = truncate_chars(content, SHORT_CONTENT_CHARS);
    format!(
        r#"Analyse ce contenu et détermine s'il contient du contenu inapproprié, offensant ou non conforme aux standards éthiques.

Contenu: {body}

Réponds uniquement par:
APPROPRIATE: OUI/NON
RAISON: [explication si NON]
"#
    )
}

pub fn build_suggestion_prompt(content: &str, aspect: SuggestionAspect) -> String {
    let body = truncate_chars(content, SHORT_CONTENT_CHARS);
    format!(
        r#"{instruction}

Contenu: {body}

Donne des suggestions concrètes et actionnables.
"#,
        instruction = aspect.instruction()
    )
}
