//! WASM bindings for frontend tournament runs and meeting replay

#![cfg(feature = "wasm")]

use serde::Serialize;
use wasm_bindgen::prelude::*;
use crate::{
    Arena, Meeting, MoralityCalculator, MoralityConfig, MoralityRow, Standing, StrategyKind,
    TournamentConfig,
};

fn js_err(context: &str, e: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{}: {}", context, e))
}

fn parse_roster(json: &str) -> Result<Vec<StrategyKind>, JsError> {
    serde_json::from_str(json).map_err(|e| js_err("Invalid roster", e))
}

#[derive(Serialize)]
struct TournamentReport {
    interaction_lengths: Vec<usize>,
    standings: Vec<Standing>,
    morality: Vec<MoralityRow>,
}

/// Run a full tournament
///
/// # Arguments
/// * `config_json` - JSON `TournamentConfig`; missing fields take defaults
/// * `roster_json` - JSON array of built-in strategies, e.g.
///   `[{"kind": "TIT_FOR_TAT"}, {"kind": "RANDOM", "p_cooperate": 0.5}]`
/// * `morality_json` - JSON `MoralityConfig`, or empty for the defaults
///
/// # Returns
/// Interaction lengths, standings, and morality rows
#[wasm_bindgen]
pub fn run_tournament(
    config_json: &str,
    roster_json: &str,
    morality_json: &str,
) -> Result<JsValue, JsError> {
    let config = TournamentConfig::from_json(config_json)
        .map_err(|e| js_err("Invalid config", e))?;
    let morality_config: MoralityConfig = if morality_json.trim().is_empty() {
        MoralityConfig::default()
    } else {
        serde_json::from_str(morality_json).map_err(|e| js_err("Invalid morality config", e))?
    };
    let roster = parse_roster(roster_json)?
        .into_iter()
        .map(StrategyKind::into_bot)
        .collect();

    let results = Arena::new()
        .run(roster, &config)
        .map_err(|e| js_err("Tournament failed", e))?;
    let morality = MoralityCalculator::with_config(&results, &morality_config)
        .map_err(|e| js_err("Morality failed", e))?;

    let report = TournamentReport {
        interaction_lengths: results.interaction_lengths().as_slice().to_vec(),
        standings: results.standings(),
        morality: morality.rows(),
    };
    serde_wasm_bindgen::to_value(&report).map_err(|e| js_err("Serialization error", e))
}

/// Replay one meeting of a tournament between two built-in strategies
///
/// # Arguments
/// * `strategy_a_json` - JSON `StrategyKind` of the bot with id `bot_a`
/// * `strategy_b_json` - JSON `StrategyKind` of the bot with id `bot_b`
/// * `bot_a` - Tournament id of the first bot
/// * `bot_b` - Tournament id of the second bot
/// * `meeting` - Meeting index within the pair
/// * `length` - Number of rounds (the meeting's interaction length)
/// * `config_json` - JSON `TournamentConfig` of the tournament
///
/// # Returns
/// Turns from the first bot's side and the summed scores
#[wasm_bindgen]
pub fn replay_meeting(
    strategy_a_json: &str,
    strategy_b_json: &str,
    bot_a: usize,
    bot_b: usize,
    meeting: usize,
    length: usize,
    config_json: &str,
) -> Result<JsValue, JsError> {
    let a: StrategyKind =
        serde_json::from_str(strategy_a_json).map_err(|e| js_err("Invalid strategy A", e))?;
    let b: StrategyKind =
        serde_json::from_str(strategy_b_json).map_err(|e| js_err("Invalid strategy B", e))?;
    let config = TournamentConfig::from_json(config_json)
        .map_err(|e| js_err("Invalid config", e))?;

    let meeting = Arena::new()
        .replay((bot_a, &a), (bot_b, &b), meeting, length, &config)
        .map_err(|e| js_err("Replay failed", e))?;

    #[derive(Serialize)]
    struct Replay {
        meeting: Meeting,
        score_a: f64,
        score_b: f64,
    }
    let (score_a, score_b) = meeting.score(&config.payoffs);
    serde_wasm_bindgen::to_value(&Replay { meeting, score_a, score_b })
        .map_err(|e| js_err("Serialization error", e))
}

#[derive(Serialize)]
struct StrategyInfo {
    kind: StrategyKind,
    name: String,
    description: &'static str,
}

/// List the built-in strategies of the classic roster
#[wasm_bindgen]
pub fn get_strategy_types() -> Result<JsValue, JsError> {
    let types: Vec<StrategyInfo> = StrategyKind::classic_roster()
        .into_iter()
        .map(|kind| StrategyInfo {
            kind,
            name: kind.name(),
            description: kind.description(),
        })
        .collect();

    serde_wasm_bindgen::to_value(&types).map_err(|e| js_err("Serialization error", e))
}
