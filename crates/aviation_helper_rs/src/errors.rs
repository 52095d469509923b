use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown slot name: {0}")]
    UnknownSlotName(String),
    #[error("invalid scenario {scenario}: {reason}")]
    InvalidScenario { scenario: String, reason: String },
}
