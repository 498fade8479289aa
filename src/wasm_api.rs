//! WASM API - thin bindings layer for JavaScript interop.
//!
//! Conversions and glue only; all decision logic lives in the core modules.
//! The frontend either keeps a `BotHandle` per agent (cheap, state stays in
//! Rust) or uses the stateless `run_bot_tick_wasm` and round-trips the
//! serialized state itself.

use crate::actions::BotAction;
use crate::config::{BotConfig, PersonalityPreset};
use crate::model::WorldSnapshot;
use crate::state::BotState;
use crate::tick::run_bot_tick;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn parse_js_value<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse {}: {}", what, e)))
}

fn serialize_result<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
}

/// Install the console logger. Safe to call more than once.
#[wasm_bindgen]
pub fn init_logging() {
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Resolve a personality preset name to its slider values.
#[wasm_bindgen]
pub fn personality_preset(name: &str) -> Result<JsValue, JsValue> {
    let preset = match name {
        "cautious" => PersonalityPreset::Cautious,
        "aggressive" => PersonalityPreset::Aggressive,
        "greedy" => PersonalityPreset::Greedy,
        "speedrunner" => PersonalityPreset::Speedrunner,
        "custom" => PersonalityPreset::Custom,
        other => return Err(JsValue::from_str(&format!("Unknown preset: {}", other))),
    };
    serialize_result(&preset.sliders())
}

/// One bot agent with its persistent state held on the Rust side.
#[wasm_bindgen]
pub struct BotHandle {
    state: BotState,
    config: BotConfig,
}

#[wasm_bindgen]
impl BotHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<BotHandle, JsValue> {
        let config: BotConfig = parse_js_value(config, "config")?;
        Ok(BotHandle {
            state: BotState::new(),
            config,
        })
    }

    /// Run one tick against a world snapshot; returns the chosen action.
    pub fn tick(&mut self, world: JsValue) -> Result<JsValue, JsValue> {
        let world: WorldSnapshot = match parse_js_value(world, "world snapshot") {
            Ok(w) => w,
            Err(e) => {
                web_sys::console::error_1(&e);
                return Err(e);
            }
        };
        let action = run_bot_tick(&world, &mut self.state, &self.config);
        serialize_result(&action)
    }

    /// Like `tick`, additionally invoking `callback` with the decision
    /// trace so the frontend can render its bot-debug overlay.
    pub fn tick_with_events(
        &mut self,
        world: JsValue,
        callback: &js_sys::Function,
    ) -> Result<JsValue, JsValue> {
        let world: WorldSnapshot = parse_js_value(world, "world snapshot")?;
        let action = run_bot_tick(&world, &mut self.state, &self.config);
        let events = serialize_result(&self.state.trace)?;
        let _ = callback.call1(&JsValue::NULL, &events);
        serialize_result(&action)
    }

    /// Decision events recorded during the most recent tick.
    pub fn trace(&self) -> Result<JsValue, JsValue> {
        serialize_result(&self.state.trace)
    }

    /// The currently persisted goal, if any.
    pub fn current_goal(&self) -> Result<JsValue, JsValue> {
        serialize_result(&self.state.current_goal)
    }

    /// Serialized bot state, for save games.
    pub fn snapshot_state(&self) -> Result<JsValue, JsValue> {
        serialize_result(&self.state)
    }

    /// Drop all persistent state, as if the agent were brand new.
    pub fn reset(&mut self) {
        self.state = BotState::new();
    }
}

/// Stateless tick for callers that persist `BotState` themselves. Returns
/// `{action, state}`.
#[wasm_bindgen]
pub fn run_bot_tick_wasm(
    world: JsValue,
    state: JsValue,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    let world: WorldSnapshot = parse_js_value(world, "world snapshot")?;
    let mut state: BotState = parse_js_value(state, "bot state")?;
    let config: BotConfig = parse_js_value(config, "config")?;

    let action = run_bot_tick(&world, &mut state, &config);

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct TickOutput {
        action: BotAction,
        state: BotState,
    }
    serialize_result(&TickOutput { action, state })
}
