pub mod actions;
pub mod config;
pub mod context;
pub mod danger;
pub mod enums;
pub mod errors;
pub mod events;
pub mod explore;
pub mod flow;
pub mod goals;
pub mod grids;
pub mod items;
pub mod model;
pub mod profile;
pub mod progression;
pub mod scenario;
pub mod state;
pub mod step;
pub mod stuck;
pub mod survival;
pub mod tick;
pub mod town;
pub mod wasm_api; // WASM bindings and JavaScript interface

#[cfg(test)]
pub mod test_fixtures;

// Re-export the surface most callers want.
pub use actions::BotAction;
pub use config::{BotCapabilities, BotConfig, PersonalityConfig, PersonalityPreset};
pub use model::WorldSnapshot;
pub use state::BotState;
pub use tick::run_bot_tick;
