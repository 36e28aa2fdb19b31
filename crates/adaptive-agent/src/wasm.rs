//! WASM bindings for frontend match replay

#![cfg(feature = "wasm")]

use js_sys::Array;
use wasm_bindgen::prelude::*;

use crate::{presets, run_match, AgentConfig, ClassicStrategy, PlayerSpec};

/// Parse a seat description.
///
/// Accepts:
/// - Full:   `{"Classic": "TitForTat"}`, `{"Preset": {"disposition": "Neutral"}}`, `{"Agent": {...}}`
/// - Bare agent config: `{"name": ..., "disposition": ..., ...}` (wrapped as `Agent`)
fn parse_player(json: &str) -> Result<PlayerSpec, String> {
    if let Ok(spec) = serde_json::from_str::<PlayerSpec>(json) {
        return Ok(spec);
    }
    let config = AgentConfig::from_json(json).map_err(|e| e.to_string())?;
    Ok(PlayerSpec::Agent(config))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Replay a match with full round-by-round details
///
/// # Arguments
/// * `player_a_json` - JSON serialized PlayerSpec or AgentConfig for player A
/// * `player_b_json` - JSON serialized PlayerSpec or AgentConfig for player B
/// * `horizon` - Number of rounds
/// * `seed` - 32-byte randomness seed
/// * `match_index` - Index of this match
///
/// # Returns
/// JSON serialized MatchResult
#[wasm_bindgen]
pub fn replay_match(
    player_a_json: &str,
    player_b_json: &str,
    horizon: u32,
    seed: &[u8],
    match_index: u32,
) -> Result<JsValue, JsError> {
    let mut player_a = parse_player(player_a_json)
        .and_then(|spec| spec.build(horizon).map_err(|e| e.to_string()))
        .map_err(|e| JsError::new(&format!("Invalid player A: {}", e)))?;
    let mut player_b = parse_player(player_b_json)
        .and_then(|spec| spec.build(horizon).map_err(|e| e.to_string()))
        .map_err(|e| JsError::new(&format!("Invalid player B: {}", e)))?;

    let seed_arr: [u8; 32] = seed.try_into()
        .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;

    let result = run_match(player_a.as_mut(), player_b.as_mut(), horizon, &seed_arr, match_index);
    to_js(&result)
}

/// Preset agent configurations for a match of `horizon` rounds
#[wasm_bindgen]
pub fn get_presets(horizon: u32) -> Result<Array, JsError> {
    let list = Array::new();
    for config in presets::all(horizon) {
        list.push(&to_js(&config)?);
    }
    Ok(list)
}

#[derive(serde::Serialize)]
struct ClassicInfo {
    id: &'static str,
    description: &'static str,
}

/// Built-in reference opponents with descriptions
#[wasm_bindgen]
pub fn get_classic_strategies() -> Result<JsValue, JsError> {
    let infos: Vec<ClassicInfo> = [
        ("TitForTat", ClassicStrategy::TitForTat),
        ("AlwaysDefect", ClassicStrategy::AlwaysDefect),
        ("AlwaysCooperate", ClassicStrategy::AlwaysCooperate),
        ("GrimTrigger", ClassicStrategy::GrimTrigger),
        ("Pavlov", ClassicStrategy::Pavlov),
        ("SuspiciousTitForTat", ClassicStrategy::SuspiciousTitForTat),
        ("Random", ClassicStrategy::Random { cooperate_bias: 0.5 }),
        ("TitForTwoTats", ClassicStrategy::TitForTwoTats),
        ("Gradual", ClassicStrategy::Gradual),
        ("Alternator", ClassicStrategy::Alternator),
    ]
    .iter()
    .map(|(id, s)| ClassicInfo { id: *id, description: s.describe() })
    .collect();

    to_js(&infos)
}

#[derive(serde::Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate an agent configuration
///
/// Returns `{valid: true}` or `{valid: false, error: "..."}`.
/// Never throws; parse and validation errors are returned as structured data.
#[wasm_bindgen]
pub fn validate_agent_config(json: &str) -> JsValue {
    let result = match AgentConfig::from_json(json) {
        Ok(_) => ValidationResult { valid: true, error: None },
        Err(e) => ValidationResult { valid: false, error: Some(e.to_string()) },
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}
