//! Deterministic template rendering keyed by validation verdict and
//! state, with an optional side-channel renderer for surface form only.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use aviation_helper_rs::{SlotBag, Validation};
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtcResponse {
    pub text: String,
    pub reason: String,
    pub renderer: String,
}

static MISSING_PROMPTS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("callsign", "say again callsign"),
        ("position", "report position"),
        ("runway", "confirm runway"),
        ("qnh", "confirm QNH"),
        ("holding_point", "report holding point"),
        ("sector", "report sector"),
        ("altitude", "report altitude"),
        ("wind", "report wind"),
        ("time", "report time"),
    ])
});

/// Inputs handed to an external [`Renderer`]; never influence state or
/// the deterministic `reason`, only the surface text.
#[derive(Debug, Clone, Serialize)]
pub struct RenderInputs<'a> {
    pub state: &'a str,
    pub scenario: &'a str,
    pub slots: &'a SlotBag,
    pub validation: &'a Validation,
    pub fallback: &'a str,
}

/// A side-channel text renderer. The default implementation always
/// declines, which is exactly equivalent to having no renderer
/// configured.
pub trait Renderer {
    fn render(&self, inputs: RenderInputs<'_>) -> Option<String>;
}

/// Declines to render; `build_atc_response` then keeps the deterministic
/// output unchanged.
pub struct NoRenderer;

impl Renderer for NoRenderer {
    fn render(&self, _inputs: RenderInputs<'_>) -> Option<String> {
        None
    }
}

#[derive(Serialize)]
struct LlmPayload<'a> {
    state: &'a str,
    scenario: &'a str,
    slots: &'a SlotBag,
    validation: &'a Validation,
    fallback: &'a str,
    instructions: &'static str,
}

#[derive(Deserialize)]
struct LlmResponseBody {
    text: Option<String>,
}

/// Posts the structured inputs to `LLM_ENDPOINT` with a short timeout.
/// Any transport failure, non-2xx status, or malformed body is swallowed
/// and treated the same as "no renderer configured" — it must never
/// surface as an error.
pub struct HttpRenderer {
    endpoint: String,
    timeout: Duration,
}

impl HttpRenderer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("LLM_ENDPOINT").ok().map(Self::new)
    }
}

impl Renderer for HttpRenderer {
    fn render(&self, inputs: RenderInputs<'_>) -> Option<String> {
        let payload = LlmPayload {
            state: inputs.state,
            scenario: inputs.scenario,
            slots: inputs.slots,
            validation: inputs.validation,
            fallback: inputs.fallback,
            instructions: "Return an ATC response in ICAO English. Wrap the final output \
                           in <ATC>...</ATC> and do not invent slots.",
        };

        let result = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .send_json(&payload);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let err = crate::Error::RendererTransport(err.to_string());
                log::warn!("{err}");
                return None;
            }
        };

        match response.into_json::<LlmResponseBody>() {
            Ok(body) => body.text,
            Err(err) => {
                let err = crate::Error::RendererTransport(err.to_string());
                log::warn!("{err}");
                None
            }
        }
    }
}

/// Substitutes `{slot}` placeholders from the slot bag; a placeholder
/// with no matching entry is left in the output unchanged, mirroring
/// `str.format` raising `KeyError` and the caller keeping the template
/// verbatim.
fn render_template(template: &str, slots: &SlotBag) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let name = &after_open[..close];
                match slots.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                out.push('{');
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

fn truthy_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Builds the controller response for `(state, scenario, slots,
/// validation)`. Missing slots take priority over wrong ones, which take
/// priority over template rendering; an external renderer (when enabled
/// via `LLM_RENDERER`) only ever replaces the surface text of the final
/// deterministic result, never its `reason`.
pub fn build_atc_response(
    state: &str,
    scenario_id: &str,
    slots: &SlotBag,
    validation: &Validation,
    renderer: &dyn Renderer,
) -> AtcResponse {
    if let Some(first) = validation.missing.first() {
        let prompt = MISSING_PROMPTS
            .get(first.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("report {first}"));
        return AtcResponse {
            text: prompt,
            reason: "missing_slot".to_string(),
            renderer: "deterministic".to_string(),
        };
    }

    if let Some(first) = validation.wrong.first() {
        return AtcResponse {
            text: format!("confirm {first}"),
            reason: "wrong_slot".to_string(),
            renderer: "deterministic".to_string(),
        };
    }

    let state_def = ScenarioRegistry::get(scenario_id, state);
    let response = match state_def.as_ref().and_then(|s| s.templates.first()) {
        Some(template) => AtcResponse {
            text: render_template(template, slots),
            reason: "template".to_string(),
            renderer: "deterministic".to_string(),
        },
        None => AtcResponse {
            text: "roger".to_string(),
            reason: "default".to_string(),
            renderer: "deterministic".to_string(),
        },
    };

    if truthy_env("LLM_RENDERER") {
        let inputs = RenderInputs {
            state,
            scenario: scenario_id,
            slots,
            validation,
            fallback: &response.text,
        };
        if let Some(text) = renderer.render(inputs) {
            return AtcResponse {
                text,
                reason: response.reason,
                renderer: "llm".to_string(),
            };
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use aviation_helper_rs::SlotName;

    fn bag(pairs: &[(&str, &str)]) -> SlotBag {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn validation(missing: Vec<SlotName>, wrong: Vec<SlotName>) -> Validation {
        let ok = missing.is_empty() && wrong.is_empty();
        Validation {
            ok,
            missing,
            wrong,
            score: if ok { 1.0 } else { 0.0 },
            reasons: vec![],
        }
    }

    #[test]
    fn missing_slot_yields_a_prompt() {
        let v = validation(vec![SlotName::Callsign], vec![]);
        let response = build_atc_response("initial_call", "graz_vfr_sector_e", &bag(&[]), &v, &NoRenderer);
        assert_eq!(response.text, "say again callsign");
        assert_eq!(response.reason, "missing_slot");
    }

    #[test]
    fn wrong_slot_asks_to_confirm() {
        let v = validation(vec![], vec![SlotName::Qnh]);
        let response = build_atc_response("qnh_update", "graz_vfr_sector_e", &bag(&[]), &v, &NoRenderer);
        assert_eq!(response.text, "confirm qnh");
        assert_eq!(response.reason, "wrong_slot");
    }

    #[test]
    fn template_renders_with_known_placeholders_and_leaves_unknown_ones() {
        let v = validation(vec![], vec![]);
        let slots = bag(&[("callsign", "D-ABC"), ("qnh", "1013")]);
        let response = build_atc_response("qnh_update", "graz_vfr_sector_e", &slots, &v, &NoRenderer);
        assert_eq!(response.text, "Report leaving sector {sector}");
        assert_eq!(response.reason, "template");
    }

    #[test]
    fn terminal_state_without_templates_defaults_to_roger() {
        let v = validation(vec![], vec![]);
        let response = build_atc_response("nonexistent_state", "graz_vfr_sector_e", &bag(&[]), &v, &NoRenderer);
        assert_eq!(response.text, "roger");
        assert_eq!(response.reason, "default");
    }

    #[test]
    fn callsign_placeholder_renders_from_the_slot_bag() {
        let v = validation(vec![], vec![]);
        let slots = bag(&[("callsign", "D-ABC")]);
        let response = build_atc_response("initial_call", "graz_vfr_sector_e", &slots, &v, &NoRenderer);
        assert_eq!(response.text, "D-ABC, Graz Tower");
    }
}
