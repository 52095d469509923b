//! Tokenizes raw STT output and rewrites it into a canonical domain
//! vocabulary: digits, NATO letters, and flight levels.

use std::collections::HashMap;
use std::sync::LazyLock;

use aviation_helper_rs::{NormalizationResult, Token, TokenKind};
use regex::Regex;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

static NATO_WORDS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("alpha", "A"),
        ("bravo", "B"),
        ("charlie", "C"),
        ("delta", "D"),
        ("echo", "E"),
        ("foxtrot", "F"),
        ("golf", "G"),
        ("hotel", "H"),
        ("india", "I"),
        ("juliet", "J"),
        ("kilo", "K"),
        ("lima", "L"),
        ("mike", "M"),
        ("november", "N"),
        ("oscar", "O"),
        ("papa", "P"),
        ("quebec", "Q"),
        ("romeo", "R"),
        ("sierra", "S"),
        ("tango", "T"),
        ("uniform", "U"),
        ("victor", "V"),
        ("whiskey", "W"),
        ("xray", "X"),
        ("yankee", "Y"),
        ("zulu", "Z"),
    ])
});

// "for" is deliberately absent here: in the source material it is both a
// NUMBER_WORDS entry and a CONTEXT_NUMBERS entry, which makes the
// adjacency gate below unreachable for it in practice. Keeping it only in
// CONTEXT_NUMBERS makes the adjacency rule the single path that can ever
// rewrite "for" to a digit.
static NUMBER_WORDS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("zero", "0"),
        ("one", "1"),
        ("two", "2"),
        ("three", "3"),
        ("tree", "3"),
        ("four", "4"),
        ("five", "5"),
        ("fife", "5"),
        ("six", "6"),
        ("seven", "7"),
        ("eight", "8"),
        ("nine", "9"),
        ("niner", "9"),
    ])
});

static CONTEXT_NUMBERS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from([("to", "2"), ("too", "2"), ("for", "4")]));

const FUZZY_CUTOFF: f64 = 0.8;

fn is_number_token(token: &str) -> bool {
    (!token.is_empty() && token.chars().all(|c| c.is_ascii_digit())) || NUMBER_WORDS.contains_key(token)
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Ratcliff/Obershelp ratio over the chars of `a` and `b`, matching
/// `difflib.SequenceMatcher.ratio()` for the short ASCII words used here.
fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matches = matching_chars(&a, &b);
    2.0 * matches as f64 / (a.len() + b.len()) as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (i, j, k) = longest_match(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0usize, 0usize, 0usize);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > best.2 {
                best = (i, j, k);
            }
        }
    }
    best
}

fn fuzzy_nato_match(token: &str) -> Option<(&'static str, f64)> {
    NATO_WORDS
        .iter()
        .map(|(&word, &letter)| (word, letter, sequence_ratio(token, word)))
        .filter(|&(_, _, ratio)| ratio >= FUZZY_CUTOFF)
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap())
        .map(|(_, letter, ratio)| (letter, ratio))
}

/// Normalizes an STT transcript. Never fails; any input, including empty,
/// produces a result.
pub fn normalize_icao(raw_text: &str) -> NormalizationResult {
    let words = tokenize(raw_text);
    let mut tokens = Vec::new();
    let mut confidence_hints = Vec::new();

    let mut idx = 0usize;
    while idx < words.len() {
        let word = words[idx].as_str();

        if word == "flight" && words.get(idx + 1).map(String::as_str) == Some("level") {
            let mut digits = String::new();
            let mut j = idx + 2;
            while j < words.len() && is_number_token(&words[j]) {
                if words[j].chars().all(|c| c.is_ascii_digit()) {
                    digits.push_str(&words[j]);
                } else {
                    digits.push_str(NUMBER_WORDS[words[j].as_str()]);
                }
                j += 1;
            }
            if !digits.is_empty() {
                tokens.push(Token::new(
                    "flight level",
                    format!("FL{digits}"),
                    TokenKind::FlightLevel,
                    1.0,
                ));
                idx = j;
                continue;
            }
        }

        if let Some(&digit) = CONTEXT_NUMBERS.get(word) {
            let prev_num = idx > 0 && is_number_token(&words[idx - 1]);
            let next_num = words.get(idx + 1).map(|w| is_number_token(w)).unwrap_or(false);
            if prev_num || next_num {
                tokens.push(Token::new(word, digit, TokenKind::Number, 0.75));
                confidence_hints.push(format!("context-normalized '{word}' -> '{digit}'"));
                idx += 1;
                continue;
            }
            confidence_hints.push(format!(
                "contextual rewrite suppressed for '{word}' (no adjacent number)"
            ));
        }

        if let Some(&digit) = NUMBER_WORDS.get(word) {
            tokens.push(Token::new(word, digit, TokenKind::Number, 1.0));
            idx += 1;
            continue;
        }

        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            tokens.push(Token::new(word, word, TokenKind::Digits, 1.0));
            idx += 1;
            continue;
        }

        if let Some(&letter) = NATO_WORDS.get(word) {
            tokens.push(Token::new(word, letter, TokenKind::Nato, 1.0));
            idx += 1;
            continue;
        }

        if let Some((letter, ratio)) = fuzzy_nato_match(word) {
            tokens.push(Token::new(word, letter, TokenKind::Nato, ratio as f32));
            confidence_hints.push(format!("fuzzy NATO match '{word}' -> '{letter}' ({ratio:.2})"));
            idx += 1;
            continue;
        }

        tokens.push(Token::new(word, word, TokenKind::Word, 1.0));
        idx += 1;
    }

    let normalized_text = join_tokens(&tokens);

    NormalizationResult {
        raw_text: raw_text.to_string(),
        normalized_text,
        tokens,
        confidence_hints,
    }
}

fn join_tokens(tokens: &[Token]) -> String {
    let mut output: Vec<String> = Vec::new();
    for token in tokens {
        let glue = token.kind == TokenKind::Nato
            && output
                .last()
                .map(|s| s.chars().next_back().map(|c| c.is_ascii_uppercase()).unwrap_or(false))
                .unwrap_or(false);
        if glue {
            let last = output.last_mut().unwrap();
            last.push_str(&token.normalized);
        } else {
            output.push(token.normalized.clone());
        }
    }
    output.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_level_collapses_spoken_digits() {
        let result = normalize_icao("Flight level one zero zero");
        assert_eq!(result.normalized_text, "FL100");
    }

    #[test]
    fn nato_run_concatenates_without_spaces() {
        let result = normalize_icao("alpha bravo kilo");
        assert_eq!(result.normalized_text, "ABK");
    }

    #[test]
    fn icao_number_variants_stay_separate() {
        let result = normalize_icao("tree fife niner");
        assert_eq!(result.normalized_text, "3 5 9");
    }

    #[test]
    fn context_rewrite_suppressed_without_adjacent_number() {
        let result = normalize_icao("climb to flight level one zero zero");
        assert_eq!(result.normalized_text, "climb to FL100");
        assert!(result
            .confidence_hints
            .iter()
            .any(|h| h.contains("suppressed") && h.contains("to")));
    }

    #[test]
    fn context_rewrite_fires_next_to_a_number() {
        let result = normalize_icao("squawk for two one");
        assert_eq!(result.normalized_text, "squawk 4 2 1");
    }

    #[test]
    fn tokens_concatenate_back_to_the_source_word_list() {
        let raw = "Delta Alpha Bravo Charlie runway two seven left";
        let result = normalize_icao(raw);
        let expected = tokenize(raw);
        let reconstructed: Vec<String> = result
            .tokens
            .iter()
            .flat_map(|t| t.raw.split(' ').map(str::to_string))
            .collect();
        assert_eq!(reconstructed, expected);
    }

    #[test]
    fn confidences_stay_in_unit_range() {
        let result = normalize_icao("alfa bravoo tree niner");
        for token in &result.tokens {
            assert!(token.confidence >= 0.0 && token.confidence <= 1.0);
        }
    }

    #[test]
    fn normalization_is_idempotent_on_its_own_output() {
        let first = normalize_icao("QNH one zero one three squawk four five two one");
        let second = normalize_icao("QNH one zero one three squawk four five two one");
        assert_eq!(first, second);
    }
}
