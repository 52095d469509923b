//! Static catalog of dialog scenarios, each a directed graph of named
//! states. Registered scenarios are immutable process-wide data; the
//! registry itself allows additional scenarios to be added at process
//! startup (see [`ScenarioRegistry::register`]).

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use aviation_helper_rs::SlotName::*;
use aviation_helper_rs::{Scenario, State, Validation};

pub const DEFAULT_SCENARIO: &str = "graz_vfr_sector_e";

fn graz_vfr_sector_e() -> Scenario {
    let mut scenario = Scenario::new();

    scenario.insert(
        "initial_call",
        State::new("initial_call")
            .with_required([Callsign])
            .with_next_states(["taxi_request"])
            .with_templates(["{callsign}, Graz Tower"]),
    );
    scenario.insert(
        "taxi_request",
        State::new("taxi_request")
            .with_required([Callsign, Position])
            .with_optional([Qnh, Taxiway])
            .with_next_states(["taxi_clearance"])
            .with_templates(["Taxi to holding point runway {runway}, via {taxiway}, QNH {qnh}"]),
    );
    scenario.insert(
        "taxi_clearance",
        State::new("taxi_clearance")
            .with_required([Callsign, Runway, Qnh])
            .with_optional([Taxiway])
            .with_next_states(["intermediate_hold"])
            .with_templates(["Hold at intermediate stop {holding_point}, give way to {traffic}"])
            .with_readback([Runway, Qnh, HoldingPoint]),
    );
    scenario.insert(
        "intermediate_hold",
        State::new("intermediate_hold")
            .with_required([Callsign, HoldingPoint])
            .with_next_states(["taxi_continue"])
            .with_templates(["Continue taxi to holding point {holding_point}"]),
    );
    scenario.insert(
        "taxi_continue",
        State::new("taxi_continue")
            .with_required([Callsign, HoldingPoint])
            .with_optional([Taxiway])
            .with_next_states(["departure_instructions"])
            .with_templates([
                "Leave the control zone via VFR sector {sector}, {altitude} or below, \
                 right turn after departure, report ready for departure",
            ]),
    );
    scenario.insert(
        "departure_instructions",
        State::new("departure_instructions")
            .with_required([Callsign, Sector, Altitude])
            .with_optional([Runway])
            .with_next_states(["lineup_wait"])
            .with_templates(["Line up runway {runway} and wait"])
            .with_readback([Sector, Altitude, Runway]),
    );
    scenario.insert(
        "lineup_wait",
        State::new("lineup_wait")
            .with_required([Callsign, Runway])
            .with_next_states(["takeoff_clearance"])
            .with_templates(["Wind {wind}, runway {runway}, cleared for takeoff"])
            .with_readback([Runway, Wind]),
    );
    scenario.insert(
        "takeoff_clearance",
        State::new("takeoff_clearance")
            .with_required([Callsign, Runway, Wind])
            .with_next_states(["airborne_time"])
            .with_templates(["Airborne time {time}, report leaving sector {sector}"])
            .with_readback([Runway, Wind]),
    );
    scenario.insert(
        "airborne_time",
        State::new("airborne_time")
            .with_required([Callsign, Time, Sector])
            .with_optional([Altitude])
            .with_next_states(["qnh_update"])
            .with_templates(["New QNH {qnh}"]),
    );
    scenario.insert(
        "qnh_update",
        State::new("qnh_update")
            .with_required([Callsign, Qnh])
            .with_next_states(["leave_sector"])
            .with_templates(["Report leaving sector {sector}"])
            .with_readback([Qnh]),
    );
    scenario.insert(
        "leave_sector",
        State::new("leave_sector")
            .with_required([Callsign, Sector, Altitude])
            .with_optional([Time])
            .with_next_states(["frequency_change"])
            .with_templates(["Approved to leave the frequency"]),
    );
    scenario.insert(
        "frequency_change",
        State::new("frequency_change")
            .with_required([Callsign])
            .with_next_states(["end"])
            .with_templates(["Frequency change approved"]),
    );
    scenario.insert(
        "end",
        State::new("end").with_templates(["End of scenario"]).terminal(),
    );

    scenario
}

pub static SCENARIOS: LazyLock<RwLock<HashMap<String, Scenario>>> = LazyLock::new(|| {
    let mut registry = HashMap::new();
    let scenario = graz_vfr_sector_e();
    aviation_helper_rs::validate_scenario(DEFAULT_SCENARIO, &scenario)
        .expect("built-in scenario must be well-formed");
    registry.insert(DEFAULT_SCENARIO.to_string(), scenario);
    RwLock::new(registry)
});

/// Read/write access to the process-wide scenario catalog.
pub struct ScenarioRegistry;

impl ScenarioRegistry {
    /// Registers (or replaces) a scenario under `name`, rejecting graphs
    /// that don't have exactly one terminal state and at least one entry
    /// state. Intended for process startup only; reads never block on
    /// each other afterward.
    pub fn register(name: impl Into<String>, scenario: Scenario) -> Result<(), crate::Error> {
        let name = name.into();
        aviation_helper_rs::validate_scenario(&name, &scenario)?;
        SCENARIOS.write().unwrap().insert(name, scenario);
        Ok(())
    }

    /// Looks up a state within a scenario in constant time.
    pub fn get(scenario: &str, state: &str) -> Option<State> {
        SCENARIOS.read().unwrap().get(scenario).and_then(|s| s.get(state)).cloned()
    }

    pub fn contains_scenario(scenario: &str) -> bool {
        SCENARIOS.read().unwrap().contains_key(scenario)
    }
}

/// Deterministic successor selection: advance to `next_states[0]` only
/// when the state is known, the verdict is `ok`, and a successor exists.
/// This is intentional — the validator's verdict is the only transition
/// signal the scenario graph needs.
pub fn advance(current: &str, validation: &Validation, scenario: &str) -> String {
    match ScenarioRegistry::get(scenario, current) {
        Some(state) if validation.ok && !state.next_states.is_empty() => {
            state.next_states[0].to_string()
        }
        _ => current.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_is_seeded() {
        assert!(ScenarioRegistry::contains_scenario(DEFAULT_SCENARIO));
        let state = ScenarioRegistry::get(DEFAULT_SCENARIO, "initial_call").unwrap();
        assert_eq!(state.next_states, vec!["taxi_request"]);
    }

    #[test]
    fn end_state_is_terminal() {
        let state = ScenarioRegistry::get(DEFAULT_SCENARIO, "end").unwrap();
        assert!(state.next_states.is_empty());
    }

    #[test]
    fn unknown_state_is_none() {
        assert!(ScenarioRegistry::get(DEFAULT_SCENARIO, "nonexistent").is_none());
    }

    #[test]
    fn advance_moves_on_ok_and_stays_otherwise() {
        let ok = Validation {
            ok: true,
            missing: vec![],
            wrong: vec![],
            score: 1.0,
            reasons: vec![],
        };
        assert_eq!(advance("initial_call", &ok, DEFAULT_SCENARIO), "taxi_request");

        let not_ok = Validation {
            ok: false,
            missing: vec![Callsign],
            wrong: vec![],
            score: 0.0,
            reasons: vec![],
        };
        assert_eq!(advance("initial_call", &not_ok, DEFAULT_SCENARIO), "initial_call");
        assert_eq!(advance("end", &ok, DEFAULT_SCENARIO), "end");
        assert_eq!(advance("unknown_state", &ok, DEFAULT_SCENARIO), "unknown_state");
    }

    #[test]
    fn custom_scenario_can_be_registered_at_startup() {
        let mut custom = Scenario::new();
        custom.insert(
            "only",
            State::new("only").with_required([Callsign]).terminal(),
        );
        ScenarioRegistry::register("custom_test_scenario", custom).unwrap();
        assert!(ScenarioRegistry::contains_scenario("custom_test_scenario"));
    }

    #[test]
    fn malformed_scenario_is_rejected_at_registration() {
        let mut broken = Scenario::new();
        broken.insert("loop", State::new("loop").with_next_states(["loop"]));
        assert!(ScenarioRegistry::register("broken_test_scenario", broken).is_err());
        assert!(!ScenarioRegistry::contains_scenario("broken_test_scenario"));
    }
}
