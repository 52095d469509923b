//! Orchestrator: composes normalize → parse → validate → advance →
//! respond into the single entrypoint the transport layer calls per
//! request.

use std::collections::HashMap;

use aviation_helper_rs::{NormalizationResult, ParsedSlot, SlotBag, SlotName, Token, Validation};
use serde::{Deserialize, Serialize};

use crate::normalizer::normalize_icao;
use crate::parser::parse_all;
use crate::response::{build_atc_response, AtcResponse, NoRenderer, Renderer};
use crate::scenario::advance;
use crate::scenario::DEFAULT_SCENARIO;
use crate::validator::validate;

/// Boundary seam for the (out-of-scope) audio-to-text front end: a
/// transcriber turns raw audio into a text string plus optional
/// time-stamped segments. No implementation is provided here — speech
/// recognition is explicitly out of scope — but the trait lets a real
/// front end hand its output straight to [`handle_stt`] without the
/// pipeline depending on any audio or model crate.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> Result<TranscriptSegments, crate::Error>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptSegments {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Request body shape for the `/stt` endpoint (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttRequest {
    pub text: String,
    pub state: String,
    #[serde(default = "default_scenario")]
    pub scenario: String,
    #[serde(default)]
    pub current_slots: Option<HashMap<String, String>>,
}

fn default_scenario() -> String {
    DEFAULT_SCENARIO.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenView {
    pub raw: String,
    pub normalized: String,
    pub kind: String,
    pub confidence: f32,
}

impl From<&Token> for TokenView {
    fn from(token: &Token) -> Self {
        Self {
            raw: token.raw.clone(),
            normalized: token.normalized.clone(),
            kind: token_kind_str(token.kind).to_string(),
            confidence: token.confidence,
        }
    }
}

fn token_kind_str(kind: aviation_helper_rs::TokenKind) -> &'static str {
    use aviation_helper_rs::TokenKind;
    match kind {
        TokenKind::Nato => "nato",
        TokenKind::Number => "number",
        TokenKind::Digits => "digits",
        TokenKind::FlightLevel => "flight_level",
        TokenKind::Word => "word",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub value: String,
    pub confidence: f32,
    pub raw_tokens: Vec<String>,
}

impl From<&ParsedSlot> for SlotView {
    fn from(slot: &ParsedSlot) -> Self {
        Self {
            value: slot.value.clone(),
            confidence: slot.confidence,
            raw_tokens: slot.raw_tokens.clone(),
        }
    }
}

/// Full response shape for the `/stt` endpoint (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttResponse {
    pub text: String,
    pub state: String,
    pub normalized: String,
    pub tokens: Vec<TokenView>,
    pub slots: HashMap<String, SlotView>,
    pub validation: Validation,
    pub next_state: String,
    pub atc_response: AtcResponse,
}

/// Composes the five/six pipeline stages for a single utterance: the
/// normalizer never fails, so this function itself cannot fail either —
/// caller-side rejection of empty text happens at the transport boundary,
/// before this is ever called.
pub fn handle_stt(
    text: &str,
    state: &str,
    current_slots: Option<&HashMap<String, String>>,
    scenario: &str,
) -> SttResponse {
    handle_stt_with_renderer(text, state, current_slots, scenario, &NoRenderer)
}

/// Same as [`handle_stt`] but with an explicit [`Renderer`], used by the
/// transport layer when `LLM_RENDERER` enables the external surface-form
/// renderer.
pub fn handle_stt_with_renderer(
    text: &str,
    state: &str,
    current_slots: Option<&HashMap<String, String>>,
    scenario: &str,
    renderer: &dyn Renderer,
) -> SttResponse {
    let normalization: NormalizationResult = normalize_icao(text);
    let parsed_slots: HashMap<SlotName, ParsedSlot> = parse_all(&normalization.tokens);

    let mut merged_slots: SlotBag = current_slots.cloned().unwrap_or_default();
    for slot in parsed_slots.values() {
        merged_slots.insert(slot.name.as_str().to_string(), slot.value.clone());
    }

    let validation = validate(state, &merged_slots, Some(&normalization.normalized_text), scenario);
    let next_state = advance(state, &validation, scenario);
    let atc_response = build_atc_response(state, scenario, &merged_slots, &validation, renderer);

    log::debug!(
        "handled stt request: state={state} scenario={scenario} ok={} next_state={next_state}",
        validation.ok
    );

    SttResponse {
        text: text.to_string(),
        state: state.to_string(),
        normalized: normalization.normalized_text,
        tokens: normalization.tokens.iter().map(TokenView::from).collect(),
        slots: parsed_slots
            .values()
            .map(|slot| (slot.name.as_str().to_string(), SlotView::from(slot)))
            .collect(),
        validation,
        next_state,
        atc_response,
    }
}
