#[cfg(test)]
mod tests {
    use crate::danger::*;
    use crate::enums::{DangerTier, MonsterFlag, PotionKind, StatusKind};
    use crate::model::{MonsterAttack, Point, StatusEffect};
    use crate::profile::{effective_personality, ClassProfile};
    use crate::state::BotState;
    use crate::test_fixtures::*;

    fn open_world(monster_positions: &[Point]) -> crate::model::WorldSnapshot {
        let fx = level_from_ascii(&[
            "############",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "#..........#",
            "############",
        ]);
        let character = make_character(Point::new(2, 2), 5);
        let monsters = monster_positions
            .iter()
            .enumerate()
            .map(|(i, &p)| make_monster(i as u32 + 1, p))
            .collect();
        make_world(fx.level, character, monsters, 10)
    }

    #[test]
    fn threat_scales_with_wakefulness() {
        let world = open_world(&[Point::new(5, 5)]);
        let mut awake = world.monsters[0].clone();
        awake.is_awake = true;
        let mut asleep = awake.clone();
        asleep.is_awake = false;
        let t_awake = monster_threat(&awake, &world.character);
        let t_asleep = monster_threat(&asleep, &world.character);
        assert!(t_awake > t_asleep);
        assert!((t_awake / t_asleep - 5.0).abs() < 1e-9); // 1.5 / 0.3
    }

    #[test]
    fn paralyze_attacks_raise_threat() {
        let world = open_world(&[Point::new(5, 5)]);
        let mut m = world.monsters[0].clone();
        let plain = monster_threat(&m, &world.character);
        m.template.attacks.push(MonsterAttack {
            avg_damage: 0.0,
            inflicts: Some(StatusKind::Paralyzed),
        });
        let scary = monster_threat(&m, &world.character);
        assert!(scary > plain);
    }

    #[test]
    fn evil_monsters_halved_under_protection() {
        let mut world = open_world(&[Point::new(5, 5)]);
        world.monsters[0].template.flags.push(MonsterFlag::Evil);
        let unprotected = monster_threat(&world.monsters[0], &world.character);
        world.character.status_effects.push(StatusEffect {
            kind: StatusKind::ProtectionFromEvil,
            remaining_turns: 10,
            magnitude: 0,
        });
        let protected = monster_threat(&world.monsters[0], &world.character);
        assert!((protected * 2.0 - unprotected).abs() < 1e-9);
    }

    #[test]
    fn danger_confined_to_radius_four() {
        let world = open_world(&[Point::new(6, 3)]);
        let mut state = BotState::new();
        compute_danger(&world, &mut state);
        let result = state.danger.as_ref().unwrap();

        let m = Point::new(6, 3);
        assert!(result.grid.get(m) > 0);
        assert!(result.grid.get(m.offset(4, 0)) > 0);
        assert_eq!(result.grid.get(m.offset(4, 0)), result.grid.get(m.offset(0, 4)));
        // Beyond Chebyshev 4 the monster contributes nothing.
        assert_eq!(result.grid.get(m.offset(-5, 0)), 0);
        assert_eq!(result.grid.get(m.offset(4, 4).offset(1, 0)), 0);
    }

    #[test]
    fn falloff_decreases_with_distance() {
        let world = open_world(&[Point::new(6, 3)]);
        let mut state = BotState::new();
        compute_danger(&world, &mut state);
        let grid = &state.danger.as_ref().unwrap().grid;
        let m = Point::new(6, 3);
        let d0 = grid.get(m);
        let d1 = grid.get(m.offset(1, 0));
        let d2 = grid.get(m.offset(2, 0));
        let d4 = grid.get(m.offset(4, 0));
        assert!(d0 > d1 && d1 > d2 && d2 > d4 && d4 > 0);
    }

    #[test]
    fn cache_hit_only_updates_timestamp() {
        let mut world = open_world(&[Point::new(6, 3)]);
        let mut state = BotState::new();
        compute_danger(&world, &mut state);
        let first_hash = state.danger.as_ref().unwrap().monster_hash;
        let first_max = state.danger.as_ref().unwrap().max_danger;

        world.turn = 11;
        compute_danger(&world, &mut state);
        let result = state.danger.as_ref().unwrap();
        assert_eq!(result.monster_hash, first_hash);
        assert_eq!(result.max_danger, first_max);
        assert_eq!(result.computed_at, 11);
    }

    #[test]
    fn cache_invalidates_when_a_monster_moves() {
        let mut world = open_world(&[Point::new(6, 3)]);
        let mut state = BotState::new();
        compute_danger(&world, &mut state);
        let first_hash = state.danger.as_ref().unwrap().monster_hash;

        world.monsters[0].position = Point::new(7, 3);
        world.turn = 11;
        compute_danger(&world, &mut state);
        assert_ne!(state.danger.as_ref().unwrap().monster_hash, first_hash);
    }

    #[test]
    fn poison_contribution_softened_by_cure() {
        let mut world = open_world(&[]);
        world.character.status_effects.push(StatusEffect {
            kind: StatusKind::Poisoned,
            remaining_turns: 10,
            magnitude: 3,
        });
        let mut state = BotState::new();
        compute_danger(&world, &mut state);
        let poisoned = state.danger.as_ref().unwrap().grid.get(world.character.position);
        assert_eq!(poisoned, 60); // 2 * 10 * 3

        world.character.inventory.push(potion(1, PotionKind::CurePoison));
        let mut state = BotState::new();
        compute_danger(&world, &mut state);
        let cured = state.danger.as_ref().unwrap().grid.get(world.character.position);
        assert_eq!(cured, 18); // 70% reduction
    }

    #[test]
    fn thresholds_follow_personality_and_hp() {
        let profile = ClassProfile::for_class("warrior");
        let mut sliders = crate::config::PersonalityConfig::default();
        sliders.aggression = 0;
        sliders.caution = 100;
        let timid = effective_personality(sliders, &profile);
        // warrior mods: aggression +15, caution -10 => 15 / 90
        // base = 100 * (1 + (30 - 135)/100) = -5 -> clamped to 50
        assert_eq!(base_threshold(&timid), 50.0);

        sliders.aggression = 100;
        sliders.caution = 0;
        let bold = effective_personality(sliders, &profile);
        // aggression clamps to 100, caution 0 => base = 300 -> clamped 200
        assert_eq!(base_threshold(&bold), 200.0);

        assert_eq!(personality_threshold(&bold, 0.2), 60.0);
        assert_eq!(personality_threshold(&bold, 0.4), 120.0);
        assert_eq!(personality_threshold(&bold, 0.7), 160.0);
        assert_eq!(personality_threshold(&bold, 1.0), 200.0);
    }

    #[test]
    fn avoidance_rewards_held_consumables() {
        let profile = ClassProfile::for_class("warrior");
        let sliders = crate::config::PersonalityConfig::default();
        let personality = effective_personality(sliders, &profile);
        let mut world = open_world(&[]);
        let bare = avoidance_threshold(&personality, &world.character);
        world.character.inventory.push(potion(1, PotionKind::Healing));
        world
            .character
            .inventory
            .push(scroll(2, crate::enums::ScrollKind::PhaseDoor));
        let stocked = avoidance_threshold(&personality, &world.character);
        assert!((stocked / bare - 1.25).abs() < 1e-9);
    }

    #[test]
    fn global_tier_boundaries() {
        assert_eq!(global_tier(0, 100.0), DangerTier::Safe);
        assert_eq!(global_tier(49, 100.0), DangerTier::Safe);
        assert_eq!(global_tier(50, 100.0), DangerTier::Caution);
        assert_eq!(global_tier(99, 100.0), DangerTier::Caution);
        assert_eq!(global_tier(100, 100.0), DangerTier::Danger);
        assert_eq!(global_tier(149, 100.0), DangerTier::Danger);
        assert_eq!(global_tier(150, 100.0), DangerTier::Critical);
    }

    #[test]
    fn no_monsters_means_immediate_safe() {
        let world = open_world(&[]);
        assert_eq!(immediate_tier(&world), DangerTier::Safe);
    }

    #[test]
    fn fast_monster_at_two_counts_half_but_stays_safe_without_adjacency() {
        let mut world = open_world(&[Point::new(4, 2)]); // distance 2 from (2,2)
        world.monsters[0].template.speed = 130;
        let (sum, any_adjacent) = immediate_threat(&world);
        assert!(sum > 0.0);
        assert!(!any_adjacent);
        // Below half HP and nothing adjacent: still SAFE.
        assert_eq!(immediate_tier(&world), DangerTier::Safe);

        // A slow monster at distance 2 contributes nothing at all.
        world.monsters[0].template.speed = 100;
        let (sum, _) = immediate_threat(&world);
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn adjacent_monster_escalates_with_hp() {
        let mut world = open_world(&[Point::new(3, 2)]);
        world.monsters[0].hp = 4; // dies in one hit, little adjacent threat
        assert_eq!(immediate_tier(&world), DangerTier::Caution);
        // The same monster against a nearly dead character reads CRITICAL.
        world.character.hp = 5;
        assert_eq!(immediate_tier(&world), DangerTier::Critical);
        // A meatier one against full HP is DANGER.
        world.character.hp = 50;
        world.monsters[0].hp = 20;
        assert_eq!(immediate_tier(&world), DangerTier::Danger);
    }
}
