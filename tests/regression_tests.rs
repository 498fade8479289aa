//! Pinned behaviours that look odd but are intentional. Do not "fix" these
//! without reading the matching notes in DESIGN.md.

mod common;

use autoplayer_wasm::actions::BotAction;
use autoplayer_wasm::config::{BotConfig, PersonalityPreset};
use autoplayer_wasm::enums::{Direction, MonsterFlag, PotionKind, ScrollKind};
use autoplayer_wasm::goals::GoalKind;
use autoplayer_wasm::model::Point;
use autoplayer_wasm::state::BotState;
use autoplayer_wasm::tick::run_bot_tick;
use common::*;

// The teleport-level scroll goes UP. The engine leans on that: with no up
// stairs known, an ascent goal burns the scroll instead of wandering.
#[test]
fn teleport_level_scroll_is_an_ascent() {
    let fx = level_from_ascii(&[
        "#########",
        "#@......#",
        "#########",
    ]);
    let mut character = make_character(fx.start.unwrap(), 8);
    character.level = 2; // forces farming via the under-levelled gate
    character.inventory.push(scroll(31, ScrollKind::TeleportLevel));
    let world = make_world(fx.level, character, Vec::new(), 90);
    let config = BotConfig::default();
    let mut state = BotState::new();

    let action = run_bot_tick(&world, &mut state, &config);
    assert!(state.farming_mode);
    let goal = state.current_goal.as_ref().unwrap();
    assert_eq!(goal.kind, GoalKind::AscendToFarm);
    assert_eq!(goal.target, None);
    assert_eq!(action, BotAction::Use { item_id: 31 });
}

// An ascend-to-farm goal stays valid while standing on the stairs; the
// arrival handler must emit the ascend on that same tick instead of
// re-evaluating away from it.
#[test]
fn ascend_goal_fires_from_the_stairs_tile() {
    let fx = level_from_ascii(&[
        "#########",
        "#<......#",
        "#########",
    ]);
    let mut character = make_character(Point::new(1, 1), 8); // on the stairs
    character.level = 2;
    let world = make_world(fx.level, character, Vec::new(), 90);
    let config = BotConfig::default();
    let mut state = BotState::new();

    let action = run_bot_tick(&world, &mut state, &config);
    assert_eq!(
        state.current_goal.as_ref().unwrap().kind,
        GoalKind::AscendToFarm
    );
    assert_eq!(action, BotAction::Ascend);
}

// The sweep-flip and unique-hunt flip machines carry independent state; a
// unique hunt must never consume or clear an armed sweep flip.
#[test]
fn flip_machines_do_not_interact() {
    let fx = level_from_ascii(&[
        "##########",
        "#@...u.v>#",
        "##########",
    ]);
    let mut u1 = make_monster(1, fx.markers[&'u'][0]);
    u1.template.flags.push(MonsterFlag::Unique);
    u1.template.min_depth = 6;
    u1.hp = 100;
    let mut u2 = make_monster(2, fx.markers[&'v'][0]);
    u2.template.flags.push(MonsterFlag::Unique);
    u2.template.min_depth = 7;
    u2.hp = 100;

    let world = make_world(fx.level, make_character(fx.start.unwrap(), 6), vec![u1, u2], 90);
    let config = BotConfig::default();
    let mut state = BotState::new();
    state.farming_mode = true;
    state.farm_blocked_depth = 7;
    state.sweep_flip_active = true;
    state.sweep_flip_target_depth = 6;
    state.sweep_flip_visited_blocked = false;

    run_bot_tick(&world, &mut state, &config);

    // The hunt armed...
    assert_eq!(state.hunting_unique_blocker, Some(1));
    assert_eq!(state.unique_hunt_flip_depth, Some(6));
    assert_eq!(
        state.current_goal.as_ref().unwrap().kind,
        GoalKind::HuntUnique
    );
    // ...and the sweep flip is exactly as it was.
    assert!(state.sweep_flip_active);
    assert_eq!(state.sweep_flip_target_depth, 6);
    assert!(!state.sweep_flip_visited_blocked);
}

// Cautious descent: a hot corridor farther than the bull-rush window sets
// danger_blocked_descent, and the next tick retreats upward instead.
#[test]
fn danger_blocked_descent_retreats_next_tick() {
    let fx = level_from_ascii(&[
        "#################",
        "#<.@....mmm....>#",
        "#################",
    ]);
    let mut character = make_character(fx.start.unwrap(), 5);
    character.level = 30;
    character.inventory.push(potion(1, PotionKind::Healing));
    let monsters: Vec<_> = fx.markers[&'m']
        .iter()
        .enumerate()
        .map(|(i, &p)| make_monster(i as u32 + 1, p))
        .collect();
    let mut world = make_world(fx.level, character, monsters, 50);
    let mut config = BotConfig::default();
    config.preset = Some(PersonalityPreset::Cautious);
    let mut state = BotState::new();

    let action = run_bot_tick(&world, &mut state, &config);
    assert_eq!(action, BotAction::Wait);
    assert!(state.danger_blocked_descent);

    world.turn = 51;
    let action = run_bot_tick(&world, &mut state, &config);
    let goal = state.current_goal.as_ref().unwrap();
    assert_eq!(goal.kind, GoalKind::AscendToFarm);
    assert_eq!(goal.target, Some(Point::new(1, 1)));
    assert_eq!(
        action,
        BotAction::Move {
            direction: Direction::West
        }
    );
}

// Sweep exhaustion is sticky for the rest of the level: after the timeout
// the sweep may not re-arm, and descent resumes.
#[test]
fn exhausted_sweep_stays_down_until_the_next_level() {
    let fx = level_from_ascii(&[
        "##########",
        "#@.......#",
        "#.......>#",
        "##########",
    ]);
    let mut character = make_character(fx.start.unwrap(), 5);
    character.class_id = "mage".into(); // squishy classes sweep by default
    character.level = 30;
    character.inventory.push(potion(1, PotionKind::Healing));
    let mut world = make_world(fx.level.clone(), character, Vec::new(), 100);
    // Explored, but freshly entered: nothing visible yet, so coverage is
    // low and the sweep wants to walk the level.
    world.level.visible.fill(0);
    let idx = world.level.idx(Point::new(1, 1));
    world.level.visible[idx] = 1;

    let config = BotConfig::default();
    let mut state = BotState::new();

    run_bot_tick(&world, &mut state, &config);
    assert!(state.sweep_mode);
    assert_eq!(state.current_goal.as_ref().unwrap().kind, GoalKind::Explore);

    // Fast-forward far past the timeout.
    state.sweep_start_turn = 0;
    world.turn = 700;
    run_bot_tick(&world, &mut state, &config);
    assert!(!state.sweep_mode);
    assert!(state.sweep_exhausted);

    // Still exhausted on the next tick; the bot heads for the stairs.
    world.turn = 701;
    run_bot_tick(&world, &mut state, &config);
    assert!(!state.sweep_mode);
    assert_eq!(state.current_goal.as_ref().unwrap().kind, GoalKind::Descend);
}
