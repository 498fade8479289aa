//! Capability and personality configuration.
//!
//! Everything here is immutable for the lifetime of an agent. Personality
//! sliders are raw values; the per-tick effective personality (sliders plus
//! class modifiers) is computed in [`crate::profile`].

use serde::{Deserialize, Serialize};

/// Five raw personality sliders. All but `patience` run 0-100; `patience`
/// is a per-level turn allowance in the 50-500 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityConfig {
    pub aggression: i32,
    pub greed: i32,
    pub caution: i32,
    pub exploration: i32,
    pub patience: i32,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        PersonalityConfig {
            aggression: 50,
            greed: 50,
            caution: 50,
            exploration: 50,
            patience: 250,
        }
    }
}

/// Named personality presets the frontend can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalityPreset {
    Cautious,
    Aggressive,
    Greedy,
    Speedrunner,
    Custom,
}

impl PersonalityPreset {
    pub fn sliders(&self) -> PersonalityConfig {
        match self {
            PersonalityPreset::Cautious => PersonalityConfig {
                aggression: 20,
                greed: 30,
                caution: 90,
                exploration: 60,
                patience: 400,
            },
            PersonalityPreset::Aggressive => PersonalityConfig {
                aggression: 85,
                greed: 40,
                caution: 15,
                exploration: 50,
                patience: 150,
            },
            PersonalityPreset::Greedy => PersonalityConfig {
                aggression: 40,
                greed: 90,
                caution: 45,
                exploration: 70,
                patience: 300,
            },
            PersonalityPreset::Speedrunner => PersonalityConfig {
                aggression: 60,
                greed: 10,
                caution: 30,
                exploration: 20,
                patience: 80,
            },
            PersonalityPreset::Custom => PersonalityConfig::default(),
        }
    }
}

/// Depth window for a capability; 0 on either end means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LevelRange {
    pub start: i32,
    pub end: i32,
}

impl LevelRange {
    pub fn contains(&self, depth: i32) -> bool {
        (self.start == 0 || depth >= self.start) && (self.end == 0 || depth <= self.end)
    }
}

/// Graded (0-3) enable levels per subsystem, plus feature toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotCapabilities {
    pub tactics: u8,
    pub retreat: u8,
    pub sweep: u8,
    pub surf: u8,
    pub kiting: u8,
    pub targeting: u8,
    pub preparedness: u8,
    pub town: bool,
    pub farming: bool,
    #[serde(default)]
    pub sweep_enabled: bool,
    #[serde(default)]
    pub sweep_range: LevelRange,
    #[serde(default)]
    pub surf_range: LevelRange,
    #[serde(default)]
    pub depth_gate_offset: i32,
}

impl Default for BotCapabilities {
    fn default() -> Self {
        BotCapabilities {
            tactics: 2,
            retreat: 2,
            sweep: 1,
            surf: 1,
            kiting: 1,
            targeting: 2,
            preparedness: 2,
            town: true,
            farming: true,
            sweep_enabled: true,
            sweep_range: LevelRange::default(),
            surf_range: LevelRange::default(),
            depth_gate_offset: 0,
        }
    }
}

impl BotCapabilities {
    /// Tether radii unlocked by the surf capability level.
    pub fn surf_radii(&self) -> &'static [i32] {
        match self.surf {
            0 => &[],
            1 => &[2],
            2 => &[2, 4],
            _ => &[2, 4, 10],
        }
    }

    /// Sweep completion threshold in percent of non-wall tiles, by level.
    pub fn sweep_threshold_pct(&self) -> u32 {
        match self.sweep {
            0 => 100,
            1 => 60,
            2 => 75,
            _ => 90,
        }
    }
}

/// Full per-agent configuration handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default)]
    pub preset: Option<PersonalityPreset>,
    #[serde(default)]
    pub personality: Option<PersonalityConfig>,
    #[serde(default)]
    pub capabilities: BotCapabilities,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            preset: None,
            personality: None,
            capabilities: BotCapabilities::default(),
        }
    }
}

impl BotConfig {
    /// Resolve the raw sliders: explicit personality wins over preset.
    pub fn sliders(&self) -> PersonalityConfig {
        if let Some(p) = self.personality {
            return p;
        }
        self.preset.unwrap_or(PersonalityPreset::Custom).sliders()
    }
}
