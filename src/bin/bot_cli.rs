//! Headless scenario runner for the autoplayer engine.
//!
//! Thin wrapper: argument parsing, file IO, and printing only. Scenario
//! semantics (the world applier and structural validation) live in the
//! library's `scenario` module, shared with the integration suites.

use autoplayer_wasm::scenario::{apply_action, validate, Scenario};
use autoplayer_wasm::state::BotState;
use autoplayer_wasm::tick::run_bot_tick;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bot_cli")]
#[command(about = "CLI tools for running the dungeon autoplayer headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario for N ticks and print the decision trace
    Trace {
        /// Path to the scenario JSON file
        scenario: PathBuf,
        /// Output format: 'markdown' or 'json'
        #[arg(short, long, default_value = "markdown")]
        format: String,
        /// Tick count override
        #[arg(short, long)]
        ticks: Option<u32>,
    },
    /// Run a single tick and print the chosen action
    Step {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },
    /// Parse a scenario and check its grids for consistency
    Validate {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },
}

fn load_scenario(path: &PathBuf) -> Scenario {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read scenario file {:?}: {}", path, e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse scenario {:?}: {}", path, e))
}

fn run_trace(scenario: &mut Scenario, format: &str, ticks: u32) {
    let mut state = BotState::new();
    let json = format == "json";
    if !json {
        println!("# Bot trace ({} ticks max)\n", ticks);
        println!("| turn | position | action | events |");
        println!("|---|---|---|---|");
    }
    for _ in 0..ticks {
        scenario.world.turn += 1;
        let action = run_bot_tick(&scenario.world, &mut state, &scenario.config);
        if json {
            let line = serde_json::json!({
                "turn": scenario.world.turn,
                "position": scenario.world.character.position,
                "action": action,
                "events": state.trace,
            });
            println!("{}", line);
        } else {
            let events: Vec<String> = state
                .trace
                .iter()
                .map(|e| serde_json::to_string(e).unwrap_or_default())
                .collect();
            println!(
                "| {} | {} | {} | {} |",
                scenario.world.turn,
                scenario.world.character.position,
                action,
                events.join(" ")
            );
        }
        if !apply_action(&mut scenario.world, &action) {
            if !json {
                println!("\ntrace ends: {}", action);
            }
            break;
        }
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Trace {
            scenario,
            format,
            ticks,
        } => {
            let mut s = load_scenario(&scenario);
            let ticks = ticks.unwrap_or(s.ticks);
            run_trace(&mut s, &format, ticks);
        }
        Commands::Step { scenario } => {
            let mut s = load_scenario(&scenario);
            let mut state = BotState::new();
            s.world.turn += 1;
            let action = run_bot_tick(&s.world, &mut state, &s.config);
            println!("{}", serde_json::to_string_pretty(&action).unwrap());
        }
        Commands::Validate { scenario } => {
            let s = load_scenario(&scenario);
            match validate(&s) {
                Ok(()) => println!("ok"),
                Err(e) => {
                    eprintln!("invalid scenario: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
