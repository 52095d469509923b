use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// The closed set of slots the parsers and scenarios know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Callsign,
    Runway,
    Altitude,
    FlightLevel,
    Qnh,
    Squawk,
    Sector,
    Position,
    Taxiway,
    HoldingPoint,
    Wind,
    Time,
}

impl SlotName {
    pub const ALL: [SlotName; 12] = [
        SlotName::Callsign,
        SlotName::Runway,
        SlotName::Altitude,
        SlotName::FlightLevel,
        SlotName::Qnh,
        SlotName::Squawk,
        SlotName::Sector,
        SlotName::Position,
        SlotName::Taxiway,
        SlotName::HoldingPoint,
        SlotName::Wind,
        SlotName::Time,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotName::Callsign => "callsign",
            SlotName::Runway => "runway",
            SlotName::Altitude => "altitude",
            SlotName::FlightLevel => "flight_level",
            SlotName::Qnh => "qnh",
            SlotName::Squawk => "squawk",
            SlotName::Sector => "sector",
            SlotName::Position => "position",
            SlotName::Taxiway => "taxiway",
            SlotName::HoldingPoint => "holding_point",
            SlotName::Wind => "wind",
            SlotName::Time => "time",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::UnknownSlotName(s.to_string()))
    }
}

/// A slot value extracted by one parser from the token stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSlot {
    pub name: SlotName,
    pub value: String,
    pub confidence: f32,
    pub raw_tokens: Vec<String>,
}

impl ParsedSlot {
    pub fn new(
        name: SlotName,
        value: impl Into<String>,
        confidence: f32,
        raw_tokens: Vec<String>,
    ) -> Self {
        Self {
            name,
            value: value.into(),
            confidence,
            raw_tokens,
        }
    }
}

/// Mapping of slot name (or `expected_<name>` readback key) to string
/// value. Plain `HashMap<String, String>` rather than `HashMap<SlotName,
/// _>` because readback expectations live outside the closed slot set.
pub type SlotBag = HashMap<String, String>;

pub fn expected_key(name: SlotName) -> String {
    format!("expected_{name}")
}
