use serde::{Deserialize, Serialize};

/// Category a [`Token`] was rewritten into during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Nato,
    Number,
    Digits,
    FlightLevel,
    Word,
}

/// One word of the input, before and after rewriting.
///
/// `raw` is a lowercased slice of the original text; `normalized` never
/// contains whitespace. `confidence` is 1.0 for exact rewrites and below
/// 1.0 for fuzzy or contextual ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub raw: String,
    pub normalized: String,
    pub kind: TokenKind,
    pub confidence: f32,
}

impl Token {
    pub fn new(
        raw: impl Into<String>,
        normalized: impl Into<String>,
        kind: TokenKind,
        confidence: f32,
    ) -> Self {
        Self {
            raw: raw.into(),
            normalized: normalized.into(),
            kind,
            confidence,
        }
    }

    /// A number-ish token is one whose normalized form could plausibly
    /// feed a number-consuming parser: plain digits or a rewritten
    /// spoken number.
    pub fn is_number_ish(&self) -> bool {
        matches!(self.kind, TokenKind::Number | TokenKind::Digits)
            && !self.normalized.is_empty()
            && self.normalized.chars().all(|c| c.is_ascii_digit())
    }
}

/// Output of the normalizer for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationResult {
    pub raw_text: String,
    pub normalized_text: String,
    pub tokens: Vec<Token>,
    pub confidence_hints: Vec<String>,
}
