use serde::{Deserialize, Serialize};

/// Internal failure kinds. None of these ever cross the tick boundary; the
/// orchestrator resolves them to a `wait` action. The WASM layer surfaces
/// parse failures as JS error strings before a tick begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    MalformedSnapshot(String),
    OutOfBounds(String),
    UnreachableGoal(String),
    Serialization(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MalformedSnapshot(msg) => write!(f, "Malformed snapshot: {}", msg),
            EngineError::OutOfBounds(msg) => write!(f, "Out of bounds: {}", msg),
            EngineError::UnreachableGoal(msg) => write!(f, "Unreachable goal: {}", msg),
            EngineError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
