//! ATC Recognition Library
//!
//! A deterministic pipeline that turns a free-form ICAO VFR radio
//! phraseology transcript into a normalized utterance, typed slot values,
//! a validation verdict, a state advancement decision, and a controller
//! response.

pub mod errors;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod response;
pub mod scenario;
pub mod validator;

pub use errors::Error;
pub use normalizer::normalize_icao;
pub use pipeline::{handle_stt, SttRequest, SttResponse, Transcriber};
pub use response::{build_atc_response, AtcResponse, Renderer};
pub use scenario::{ScenarioRegistry, SCENARIOS};
pub use validator::validate;
