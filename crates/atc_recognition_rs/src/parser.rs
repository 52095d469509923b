//! Slot-specific recognizers over a normalized [`Token`] stream.
//!
//! Each parser scans from the start of the token stream and returns at
//! most one [`ParsedSlot`]. Parsers never re-enter another parser's
//! consumed range because they don't share state at all: every parser is
//! an independent pure function of the full token stream, so the same
//! token can feed more than one slot (e.g. a bare digit run after
//! `runway` and `altitude` keywords). The validator, not the parser
//! layer, resolves any resulting conflicts.

use std::collections::HashMap;
use std::sync::LazyLock;

use aviation_helper_rs::{ParsedSlot, SlotName, Token, TokenKind};
use regex::Regex;

static CALLSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,2}-?[A-Z0-9]{2,5}$").unwrap());

static RUNWAY_SUFFIX: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("l", "L"),
        ("left", "L"),
        ("r", "R"),
        ("right", "R"),
        ("c", "C"),
        ("center", "C"),
        ("centre", "C"),
    ])
});

static SENTINEL: Token = Token {
    raw: String::new(),
    normalized: String::new(),
    kind: TokenKind::Word,
    confidence: 1.0,
};

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Recognizes a callsign either from one or two adjacent tokens whose
/// (hyphen-joined) normalized text matches the ICAO callsign shape, or
/// from a maximal run of NATO letters long enough to split into a
/// prefix/body pair.
pub fn parse_callsign(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        let value = token.normalized.as_str();
        if CALLSIGN_RE.is_match(value) {
            return Some(ParsedSlot::new(
                SlotName::Callsign,
                value,
                token.confidence,
                vec![token.raw.clone()],
            ));
        }

        if let Some(next) = tokens.get(idx + 1) {
            let combined = format!("{value}-{}", next.normalized);
            if CALLSIGN_RE.is_match(&combined) {
                return Some(ParsedSlot::new(
                    SlotName::Callsign,
                    combined,
                    token.confidence.min(next.confidence),
                    vec![token.raw.clone(), next.raw.clone()],
                ));
            }
        }
    }

    let mut nato_run: Vec<&Token> = Vec::new();
    for token in tokens.iter().chain(std::iter::once(&SENTINEL)) {
        if token.kind == TokenKind::Nato {
            nato_run.push(token);
            continue;
        }

        if nato_run.len() >= 3 {
            let letters: String = nato_run.iter().map(|t| t.normalized.as_str()).collect();
            for prefix_len in [1usize, 2] {
                if letters.len() > prefix_len {
                    let candidate = format!("{}-{}", &letters[..prefix_len], &letters[prefix_len..]);
                    if CALLSIGN_RE.is_match(&candidate) {
                        let confidence = nato_run
                            .iter()
                            .map(|t| t.confidence)
                            .fold(f32::INFINITY, f32::min);
                        return Some(ParsedSlot::new(
                            SlotName::Callsign,
                            candidate,
                            confidence,
                            nato_run.iter().map(|t| t.raw.clone()).collect(),
                        ));
                    }
                }
            }
        }
        nato_run.clear();
    }

    None
}

/// Finds the first `FLIGHT_LEVEL` token and emits it verbatim.
pub fn parse_flight_level(tokens: &[Token]) -> Option<ParsedSlot> {
    tokens
        .iter()
        .find(|t| t.kind == TokenKind::FlightLevel && t.normalized.starts_with("FL"))
        .map(|t| ParsedSlot::new(SlotName::FlightLevel, t.normalized.clone(), t.confidence, vec![t.raw.clone()]))
}

/// Consumes the maximal prefix of `NUMBER`/`DIGITS` tokens starting at
/// `tokens`, returning the concatenated digits, their raw slices, and the
/// minimum confidence across them.
fn consume_number_sequence(tokens: &[Token]) -> (String, Vec<String>, f32) {
    let mut digits = String::new();
    let mut raw_tokens = Vec::new();
    let mut confidence = f32::INFINITY;
    for token in tokens {
        if matches!(token.kind, TokenKind::Number | TokenKind::Digits) && is_all_digits(&token.normalized) {
            digits.push_str(&token.normalized);
            raw_tokens.push(token.raw.clone());
            confidence = confidence.min(token.confidence);
        } else {
            break;
        }
    }
    if raw_tokens.is_empty() {
        confidence = 0.0;
    }
    (digits, raw_tokens, confidence)
}

/// Finds the `runway` keyword, consumes the following number run, and
/// left-pads it to width 2, appending an `L`/`R`/`C` suffix when the next
/// token names one.
pub fn parse_runway(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if token.normalized != "runway" {
            continue;
        }
        let (digits, mut raw_tokens, mut confidence) = consume_number_sequence(&tokens[idx + 1..]);
        if digits.is_empty() {
            continue;
        }
        let runway = format!("{digits:0>2}");
        let mut suffix = "";
        if let Some(next) = tokens.get(idx + 1 + raw_tokens.len()) {
            if let Some(&letter) = RUNWAY_SUFFIX.get(next.normalized.to_lowercase().as_str()) {
                suffix = letter;
                raw_tokens.push(next.raw.clone());
                confidence = confidence.min(next.confidence);
            }
        }
        let mut all_raw = vec![token.raw.clone()];
        all_raw.extend(raw_tokens);
        return Some(ParsedSlot::new(SlotName::Runway, format!("{runway}{suffix}"), confidence, all_raw));
    }
    None
}

fn parse_keyword_then_number(tokens: &[Token], keywords: &[&str], name: SlotName) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if keywords.contains(&token.normalized.as_str()) {
            let (digits, raw_tokens, confidence) = consume_number_sequence(&tokens[idx + 1..]);
            if !digits.is_empty() {
                let mut all_raw = vec![token.raw.clone()];
                all_raw.extend(raw_tokens);
                return Some(ParsedSlot::new(name, digits, confidence, all_raw));
            }
        }
    }
    None
}

/// `{altitude, alt, height}` followed by a number run.
pub fn parse_altitude(tokens: &[Token]) -> Option<ParsedSlot> {
    parse_keyword_then_number(tokens, &["altitude", "alt", "height"], SlotName::Altitude)
}

/// `qnh` followed by a number run.
pub fn parse_qnh(tokens: &[Token]) -> Option<ParsedSlot> {
    parse_keyword_then_number(tokens, &["qnh"], SlotName::Qnh)
}

/// `squawk` followed by a number run.
pub fn parse_squawk(tokens: &[Token]) -> Option<ParsedSlot> {
    parse_keyword_then_number(tokens, &["squawk"], SlotName::Squawk)
}

/// A NATO token, or a short alphanumeric token, uppercased.
fn normalize_letter_token(token: &Token) -> Option<String> {
    if token.kind == TokenKind::Nato {
        return Some(token.normalized.clone());
    }
    if !token.normalized.is_empty()
        && token.normalized.len() <= 3
        && token.normalized.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Some(token.normalized.to_uppercase());
    }
    None
}

/// `{sector, sektor}` followed by a NATO token or short alphanumeric one.
pub fn parse_sector(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if matches!(token.normalized.as_str(), "sector" | "sektor") {
            if let Some(next) = tokens.get(idx + 1) {
                if let Some(letter) = normalize_letter_token(next) {
                    return Some(ParsedSlot::new(
                        SlotName::Sector,
                        letter,
                        next.confidence,
                        vec![token.raw.clone(), next.raw.clone()],
                    ));
                }
            }
        }
    }
    None
}

/// `apron`, optionally followed by one `WORD` token.
pub fn parse_position(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if token.normalized == "apron" {
            let mut value = "apron".to_string();
            let mut raw_tokens = vec![token.raw.clone()];
            let mut confidence = token.confidence;
            if let Some(next) = tokens.get(idx + 1) {
                if next.kind == TokenKind::Word {
                    value = format!("{value} {}", next.normalized);
                    raw_tokens.push(next.raw.clone());
                    confidence = confidence.min(next.confidence);
                }
            }
            return Some(ParsedSlot::new(SlotName::Position, value, confidence, raw_tokens));
        }
    }
    None
}

/// `taxiway` followed by one letter-like token.
pub fn parse_taxiway(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if token.normalized == "taxiway" {
            if let Some(next) = tokens.get(idx + 1) {
                if let Some(letter) = normalize_letter_token(next) {
                    return Some(ParsedSlot::new(
                        SlotName::Taxiway,
                        letter,
                        next.confidence,
                        vec![token.raw.clone(), next.raw.clone()],
                    ));
                }
            }
        }
    }
    None
}

/// Either `{holding|hold}` `point` `<letter>`, or `stop` `<letter>`.
pub fn parse_holding_point(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if matches!(token.normalized.as_str(), "holding" | "hold") {
            if let Some(point_token) = tokens.get(idx + 1) {
                if point_token.normalized == "point" {
                    if let Some(candidate) = tokens.get(idx + 2) {
                        if let Some(value) = normalize_letter_token(candidate) {
                            return Some(ParsedSlot::new(
                                SlotName::HoldingPoint,
                                value,
                                candidate.confidence,
                                vec![token.raw.clone(), point_token.raw.clone(), candidate.raw.clone()],
                            ));
                        }
                    }
                }
            }
        }
        if token.normalized == "stop" {
            if let Some(candidate) = tokens.get(idx + 1) {
                if let Some(value) = normalize_letter_token(candidate) {
                    return Some(ParsedSlot::new(
                        SlotName::HoldingPoint,
                        value,
                        candidate.confidence,
                        vec![token.raw.clone(), candidate.raw.clone()],
                    ));
                }
            }
        }
    }
    None
}

/// `wind` then a digit-string direction, with an optional speed either as
/// a `kt`-suffixed token or a following digit token (itself optionally
/// followed by a bare `kt`/`kts`).
pub fn parse_wind(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if token.normalized != "wind" {
            continue;
        }
        let Some(direction) = tokens.get(idx + 1) else { continue };
        if !is_all_digits(&direction.normalized) {
            continue;
        }

        let mut speed: Option<String> = None;
        let mut speed_confidence = direction.confidence;
        if let Some(candidate) = tokens.get(idx + 2) {
            if let Some(stripped) = candidate.normalized.strip_suffix("kt") {
                speed = Some(stripped.to_string());
                speed_confidence = speed_confidence.min(candidate.confidence);
            } else if is_all_digits(&candidate.normalized) {
                speed = Some(candidate.normalized.clone());
                speed_confidence = speed_confidence.min(candidate.confidence);
                if let Some(unit) = tokens.get(idx + 3) {
                    if matches!(unit.normalized.as_str(), "kt" | "kts") {
                        speed_confidence = speed_confidence.min(unit.confidence);
                    }
                }
            }
        }

        return Some(match speed {
            Some(speed) => ParsedSlot::new(
                SlotName::Wind,
                format!("{}/{speed}", direction.normalized),
                speed_confidence,
                vec![token.raw.clone(), direction.raw.clone()],
            ),
            None => ParsedSlot::new(
                SlotName::Wind,
                direction.normalized.clone(),
                direction.confidence,
                vec![token.raw.clone(), direction.raw.clone()],
            ),
        });
    }
    None
}

/// `time` followed by a digit-string.
pub fn parse_time(tokens: &[Token]) -> Option<ParsedSlot> {
    for (idx, token) in tokens.iter().enumerate() {
        if token.normalized == "time" {
            if let Some(next) = tokens.get(idx + 1) {
                if is_all_digits(&next.normalized) {
                    return Some(ParsedSlot::new(
                        SlotName::Time,
                        next.normalized.clone(),
                        next.confidence,
                        vec![token.raw.clone(), next.raw.clone()],
                    ));
                }
            }
        }
    }
    None
}

/// Runs every slot parser against the same token stream and collects the
/// ones that matched, keyed by slot name.
pub fn parse_all(tokens: &[Token]) -> HashMap<SlotName, ParsedSlot> {
    let parsers: [fn(&[Token]) -> Option<ParsedSlot>; 12] = [
        parse_callsign,
        parse_runway,
        parse_altitude,
        parse_flight_level,
        parse_qnh,
        parse_squawk,
        parse_sector,
        parse_position,
        parse_taxiway,
        parse_holding_point,
        parse_wind,
        parse_time,
    ];
    let mut slots = HashMap::new();
    for parser in parsers {
        if let Some(slot) = parser(tokens) {
            slots.insert(slot.name, slot);
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_icao;

    #[test]
    fn callsign_and_runway_from_nato_run() {
        let result = normalize_icao("Delta alpha bravo charlie runway two seven left");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Callsign].value, "D-ABC");
        assert_eq!(slots[&SlotName::Runway].value, "27L");
    }

    #[test]
    fn altitude_from_keyword_and_number_run() {
        let result = normalize_icao("Climb to altitude two five zero zero");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Altitude].value, "2500");
    }

    #[test]
    fn flight_level_slot_mirrors_the_token() {
        let result = normalize_icao("Flight level one zero zero");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::FlightLevel].value, "FL100");
    }

    #[test]
    fn qnh_and_squawk_in_the_same_utterance() {
        let result = normalize_icao("QNH one zero one three squawk four five two one");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Qnh].value, "1013");
        assert_eq!(slots[&SlotName::Squawk].value, "4521");
    }

    #[test]
    fn sector_from_single_letter() {
        let result = normalize_icao("Leave sector E at 3000 feet");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Sector].value, "E");
    }

    #[test]
    fn position_with_trailing_word() {
        let result = normalize_icao("Apron south request taxi");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Position].value, "apron south");
    }

    #[test]
    fn holding_point_and_taxiway_together() {
        let result = normalize_icao("Taxi to holding point B via taxiway B");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::HoldingPoint].value, "B");
        assert_eq!(slots[&SlotName::Taxiway].value, "B");
    }

    #[test]
    fn wind_with_speed() {
        let result = normalize_icao("Wind 030 5kt");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Wind].value, "030/5");
    }

    #[test]
    fn time_slot() {
        let result = normalize_icao("Airborne time 13");
        let slots = parse_all(&result.tokens);
        assert_eq!(slots[&SlotName::Time].value, "13");
    }

    #[test]
    fn no_callsign_extracted_from_bare_numbers() {
        let result = normalize_icao("tree fife niner");
        let slots = parse_all(&result.tokens);
        assert!(!slots.contains_key(&SlotName::Callsign));
    }
}
