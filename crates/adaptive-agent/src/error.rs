//! Construction-time configuration errors
//!
//! Nothing in here can happen mid-match: an `Agent` only exists once its
//! configuration has passed `AgentConfig::validate`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("horizon must be at least one round")]
    ZeroHorizon,

    #[error("window `{name}` must cover at least one round")]
    EmptyWindow { name: &'static str },

    #[error("opening sequence has {provided} moves but the opening phase lasts {required} rounds")]
    ShortOpening { required: u32, provided: usize },

    #[error("probability `{name}` = {value} is outside [0, 1]")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("shift `{name}` = {value} is not a finite number")]
    NonFiniteShift { name: &'static str, value: f64 },

    #[error("clamp range is inverted: min {min} > max {max}")]
    InvertedClamp { min: f64, max: f64 },

    #[error("window thresholds are inverted: low {low} > high {high}")]
    InvertedThresholds { low: f64, high: f64 },

    #[error("probe interval is inverted or empty: [{min}, {max}]")]
    InvalidInterval { min: u32, max: u32 },

    #[error("mode #{index} ({mode}) has a zero {field}")]
    ZeroDuration { index: usize, mode: &'static str, field: &'static str },

    #[error("caution mode #{index} exits at {exit_above}, below its entry threshold {enter_below}")]
    InvertedHysteresis { index: usize, enter_below: f64, exit_above: f64 },

    #[error("pattern rule #{index} has an empty response")]
    EmptyResponse { index: usize },

    #[error("pattern rule #{index} has a window too short to match")]
    EmptyPattern { index: usize },

    #[error("adjustment {0:?} appears more than once in the stacking order")]
    DuplicateAdjustment(crate::modulator::Adjustment),

    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}
