use std::collections::{HashMap, HashSet};

use crate::errors::Error;
use crate::slot::SlotName;

/// One node of a scenario's dialog graph.
#[derive(Debug, Clone)]
pub struct State {
    pub name: &'static str,
    pub required_slots: Vec<SlotName>,
    pub optional_slots: Vec<SlotName>,
    pub next_states: Vec<&'static str>,
    pub templates: Vec<&'static str>,
    pub readback_required: bool,
    pub readback_slots: Vec<SlotName>,
}

impl State {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            required_slots: Vec::new(),
            optional_slots: Vec::new(),
            next_states: Vec::new(),
            templates: Vec::new(),
            readback_required: false,
            readback_slots: Vec::new(),
        }
    }

    pub fn with_required(mut self, slots: impl IntoIterator<Item = SlotName>) -> Self {
        self.required_slots = slots.into_iter().collect();
        self
    }

    pub fn with_optional(mut self, slots: impl IntoIterator<Item = SlotName>) -> Self {
        self.optional_slots = slots.into_iter().collect();
        self
    }

    pub fn with_next_states(mut self, states: impl IntoIterator<Item = &'static str>) -> Self {
        self.next_states = states.into_iter().collect();
        self
    }

    pub fn with_templates(mut self, templates: impl IntoIterator<Item = &'static str>) -> Self {
        self.templates = templates.into_iter().collect();
        self
    }

    pub fn with_readback(mut self, slots: impl IntoIterator<Item = SlotName>) -> Self {
        self.readback_required = true;
        self.readback_slots = slots.into_iter().collect();
        self
    }

    pub fn terminal(self) -> Self {
        self
    }
}

/// A named directed graph of [`State`]s. Exactly one terminal state (no
/// `next_states`) and at least one entry state (no incoming edges) is
/// expected of a well-formed scenario, though this type itself does not
/// enforce it — see [`validate_scenario`], called by the registry on
/// registration.
pub type Scenario = HashMap<&'static str, State>;

/// Checks the structural invariants a scenario graph must hold: exactly
/// one terminal state and at least one entry state.
pub fn validate_scenario(name: &str, scenario: &Scenario) -> Result<(), Error> {
    let terminal_count = scenario.values().filter(|s| s.next_states.is_empty()).count();
    if terminal_count != 1 {
        return Err(Error::InvalidScenario {
            scenario: name.to_string(),
            reason: format!("expected exactly one terminal state, found {terminal_count}"),
        });
    }

    let targets: HashSet<&str> = scenario.values().flat_map(|s| s.next_states.iter().copied()).collect();
    if scenario.keys().all(|state_name| targets.contains(state_name)) {
        return Err(Error::InvalidScenario {
            scenario: name.to_string(),
            reason: "no entry state: every state has an incoming edge".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotName;

    #[test]
    fn well_formed_scenario_passes_validation() {
        let mut scenario = Scenario::new();
        scenario.insert(
            "start",
            State::new("start").with_required([SlotName::Callsign]).with_next_states(["end"]),
        );
        scenario.insert("end", State::new("end").terminal());
        assert!(validate_scenario("test", &scenario).is_ok());
    }

    #[test]
    fn scenario_without_a_terminal_state_is_rejected() {
        let mut scenario = Scenario::new();
        scenario.insert("start", State::new("start").with_next_states(["start"]));
        assert!(validate_scenario("test", &scenario).is_err());
    }

    #[test]
    fn scenario_without_an_entry_state_is_rejected() {
        let mut scenario = Scenario::new();
        scenario.insert("a", State::new("a").with_next_states(["b"]));
        scenario.insert("b", State::new("b").with_next_states(["a"]));
        assert!(validate_scenario("test", &scenario).is_err());
    }
}
