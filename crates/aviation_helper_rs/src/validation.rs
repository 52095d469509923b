use serde::{Deserialize, Serialize};

use crate::slot::SlotName;

/// Verdict produced by the validator for one (state, slot bag) pair.
///
/// `ok` holds iff both `missing` and `wrong` are empty. `score` is
/// `max(0, required - |missing| - |wrong|) / required`, or `1.0` when the
/// state has no required slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub ok: bool,
    pub missing: Vec<SlotName>,
    pub wrong: Vec<SlotName>,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl Validation {
    pub fn compute(required: usize, missing: &[SlotName], wrong: &[SlotName]) -> f64 {
        if required == 0 {
            return 1.0;
        }
        let penalty = missing.len() + wrong.len();
        let numerator = required.saturating_sub(penalty) as f64;
        let score = numerator / required as f64;
        (score.max(0.0) * 100.0).round() / 100.0
    }
}
