//! Classifies required slots against a state's expectations and checks
//! readback equality against `expected_<name>` entries in the slot bag.

use std::collections::HashMap;
use std::sync::LazyLock;

use aviation_helper_rs::{expected_key, SlotBag, SlotName, Validation};

use crate::scenario::ScenarioRegistry;

/// Consulted only when the (state, scenario) pair is unknown to the
/// scenario registry. The original table covers every legacy state name
/// plus a duplicate of every scenario-registered state; `get_state`
/// always resolves scenario states first, so in practice only the three
/// truly legacy names (`clearance`, `taxi`, `takeoff`) are ever consulted
/// here. `destination` is dropped from `clearance`'s entry: it has no
/// parser that can ever populate it and falls outside the closed
/// `SlotName` set, so it can never appear in `missing`/`wrong`.
static LEGACY_EXPECTATIONS: LazyLock<HashMap<&'static str, Vec<SlotName>>> = LazyLock::new(|| {
    use SlotName::*;
    HashMap::from([
        ("clearance", vec![Callsign, Runway, Qnh]),
        ("taxi", vec![Callsign, Runway]),
        ("takeoff", vec![Callsign, Runway]),
    ])
});

fn normalize_text(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_lowercase()
}

fn normalize_runway(value: &str) -> String {
    let text = normalize_text(Some(value));
    if text.is_empty() {
        return String::new();
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let suffix: String = text.chars().filter(|c| c.is_alphabetic()).collect();
    if digits.is_empty() {
        text
    } else {
        format!("{digits}{suffix}")
    }
}

fn runway_matches(expected: &str, actual: &str) -> bool {
    let expected_norm = normalize_runway(expected);
    let actual_norm = normalize_runway(actual);
    if expected_norm.is_empty() || actual_norm.is_empty() {
        return false;
    }
    let expected_digits: String = expected_norm.chars().filter(|c| c.is_ascii_digit()).collect();
    let actual_digits: String = actual_norm.chars().filter(|c| c.is_ascii_digit()).collect();
    if expected_digits.is_empty() || actual_digits.is_empty() {
        return expected_norm == actual_norm;
    }
    expected_digits == actual_digits
}

fn qnh_valid(value: &str) -> bool {
    let text = normalize_text(Some(value));
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match text.parse::<i64>() {
        Ok(qnh) => (900..=1100).contains(&qnh),
        Err(_) => false,
    }
}

fn wind_valid(value: &str) -> bool {
    let text = normalize_text(Some(value));
    if text.is_empty() {
        return false;
    }
    if let Some((direction, speed)) = text.split_once('/') {
        let digits_only = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        return digits_only(direction) && digits_only(speed) && matches!(direction.len(), 2 | 3);
    }
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn time_valid(value: &str) -> bool {
    let text = normalize_text(Some(value));
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    text.parse::<i64>().map(|t| (0..=59).contains(&t)).unwrap_or(false)
}

fn sector_valid(value: &str) -> bool {
    let text = normalize_text(Some(value));
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric())
}

fn expected_rules_for_state(state: &str, scenario: &str) -> Vec<SlotName> {
    match ScenarioRegistry::get(scenario, state) {
        Some(state_def) => state_def.required_slots,
        None => LEGACY_EXPECTATIONS.get(state).cloned().unwrap_or_default(),
    }
}

fn readback_expectations(state: &str, scenario: &str) -> Vec<SlotName> {
    match ScenarioRegistry::get(scenario, state) {
        Some(state_def) if state_def.readback_required => state_def.readback_slots,
        _ => Vec::new(),
    }
}

/// Validates `slots` for `state` within `scenario`. Missing/wrong slots
/// are data, never an `Err`: an unknown state (or scenario) falls back to
/// the legacy expectation table and is not itself an error condition.
pub fn validate(state: &str, slots: &SlotBag, normalized_text: Option<&str>, scenario: &str) -> Validation {
    let expected_rules = expected_rules_for_state(state, scenario);
    let readback_slots = readback_expectations(state, scenario);

    let mut missing = Vec::new();
    let mut wrong = Vec::new();
    let mut reasons = Vec::new();

    for &rule in &expected_rules {
        let value = slots.get(rule.as_str()).map(String::as_str);
        if value.is_none() || normalize_text(value).is_empty() {
            missing.push(rule);
            reasons.push(format!("missing: {rule}"));
            continue;
        }
        let value = value.unwrap();

        match rule {
            SlotName::Runway => {
                let expected_runway = slots.get("expected_runway").map(String::as_str).unwrap_or(value);
                if !runway_matches(expected_runway, value) {
                    wrong.push(rule);
                    reasons.push(format!("runway mismatch: expected {expected_runway}, got {value}"));
                }
            }
            SlotName::Qnh => {
                if !qnh_valid(value) {
                    wrong.push(rule);
                    reasons.push(format!("invalid qnh: {value}"));
                }
            }
            SlotName::Wind => {
                if !wind_valid(value) {
                    wrong.push(rule);
                    reasons.push(format!("invalid wind: {value}"));
                }
            }
            SlotName::Time => {
                if !time_valid(value) {
                    wrong.push(rule);
                    reasons.push(format!("invalid time: {value}"));
                }
            }
            SlotName::Sector => {
                if !sector_valid(value) {
                    wrong.push(rule);
                    reasons.push(format!("invalid sector: {value}"));
                }
            }
            _ => {}
        }
    }

    for slot_name in readback_slots {
        let Some(expected_value) = slots.get(&expected_key(slot_name)) else {
            continue;
        };
        let actual_value = slots.get(slot_name.as_str()).map(String::as_str);
        if actual_value.is_none() || normalize_text(actual_value).is_empty() {
            missing.push(slot_name);
            reasons.push(format!("readback missing: {slot_name}"));
            continue;
        }
        let actual_value = actual_value.unwrap();
        if normalize_text(Some(expected_value)) != normalize_text(Some(actual_value)) {
            wrong.push(slot_name);
            reasons.push(format!("readback mismatch: expected {expected_value}, got {actual_value}"));
        }
    }

    if expected_rules.is_empty() {
        reasons.push("no expectations configured for state".to_string());
    }

    let score = Validation::compute(expected_rules.len(), &missing, &wrong);

    if let Some(text) = normalized_text {
        reasons.push(format!("checked text: {text}"));
    }

    Validation {
        ok: missing.is_empty() && wrong.is_empty(),
        missing,
        wrong,
        score,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aviation_helper_rs::SlotBag;

    fn bag(pairs: &[(&str, &str)]) -> SlotBag {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn clearance_with_valid_runway_and_qnh_is_ok() {
        let slots = bag(&[("callsign", "DLH1"), ("runway", "27L"), ("qnh", "1013")]);
        let v = validate("clearance", &slots, None, "graz_vfr_sector_e");
        assert!(v.ok);
        assert!(v.missing.is_empty());
        assert!(v.wrong.is_empty());
    }

    #[test]
    fn clearance_with_bare_runway_digits_still_matches() {
        let slots = bag(&[("callsign", "DLH1"), ("runway", "27"), ("qnh", "950")]);
        let v = validate("clearance", &slots, None, "graz_vfr_sector_e");
        assert!(v.ok);
    }

    #[test]
    fn clearance_with_invalid_qnh_is_wrong() {
        let slots = bag(&[("callsign", "DLH1"), ("runway", "09"), ("qnh", "abc")]);
        let v = validate("clearance", &slots, None, "graz_vfr_sector_e");
        assert!(!v.ok);
        assert!(v.wrong.contains(&SlotName::Qnh));
    }

    #[test]
    fn taxi_missing_runway_is_reported() {
        let slots = bag(&[("callsign", "DLH1")]);
        let v = validate("taxi", &slots, Some("taxi to holding point"), "graz_vfr_sector_e");
        assert!(!v.ok);
        assert_eq!(v.missing, vec![SlotName::Runway]);
        assert!(v.wrong.is_empty());
    }

    #[test]
    fn unknown_state_reports_no_expectations_and_is_ok() {
        let slots = bag(&[]);
        let v = validate("not_a_real_state", &slots, None, "graz_vfr_sector_e");
        assert!(v.ok);
        assert_eq!(v.score, 1.0);
        assert!(v.reasons.iter().any(|r| r == "no expectations configured for state"));
    }

    #[test]
    fn readback_mismatch_is_flagged_as_wrong() {
        let slots = bag(&[
            ("callsign", "D-ABC"),
            ("runway", "27L"),
            ("qnh", "1013"),
            ("holding_point", "B"),
            ("expected_runway", "27L"),
            ("expected_qnh", "1013"),
            ("expected_holding_point", "A"),
        ]);
        let v = validate("taxi_clearance", &slots, None, "graz_vfr_sector_e");
        assert!(!v.ok);
        assert!(v.wrong.contains(&SlotName::HoldingPoint));
    }

    #[test]
    fn no_slot_is_both_missing_and_wrong() {
        let slots = bag(&[("callsign", "D-ABC")]);
        let v = validate("taxi_clearance", &slots, None, "graz_vfr_sector_e");
        for name in &v.missing {
            assert!(!v.wrong.contains(name));
        }
    }

    #[test]
    fn score_matches_the_documented_formula() {
        let slots = bag(&[("callsign", "D-ABC")]);
        let v = validate("taxi_clearance", &slots, None, "graz_vfr_sector_e");
        assert_eq!(v.score, 0.33);
        assert!(v.score >= 0.0 && v.score <= 1.0);
    }
}
