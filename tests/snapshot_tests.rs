//! Snapshot regression for a short deterministic run over a recorded
//! scenario. When decision logic changes on purpose, review and re-accept
//! with `cargo insta review`.

mod common;

use autoplayer_wasm::scenario::apply_action;
use autoplayer_wasm::state::BotState;
use autoplayer_wasm::tick::run_bot_tick;
use common::load_scenario;

#[test]
fn descend_corridor_trace() {
    let mut scenario = load_scenario("descend_corridor.json");
    let mut state = BotState::new();

    let mut trace: Vec<String> = Vec::new();
    for _ in 0..scenario.ticks {
        scenario.world.turn += 1;
        let action = run_bot_tick(&scenario.world, &mut state, &scenario.config);
        trace.push(format!(
            "turn {} @{} -> {}",
            scenario.world.turn, scenario.world.character.position, action
        ));
        if !apply_action(&mut scenario.world, &action) {
            break;
        }
    }

    insta::assert_json_snapshot!("descend_corridor_trace", trace);
}
