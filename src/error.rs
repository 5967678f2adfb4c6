//! Error types
//!
//! Nothing here reaches the game loop: border errors are logged and the
//! offending edit dropped, tuning errors surface only when loading a file.

use thiserror::Error;

/// A border append that would corrupt a chain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BorderError {
    /// Coordinates were NaN or infinite
    #[error("non-finite border point ({x}, {y})")]
    NonFinite { x: f32, y: f32 },

    /// The new run would end before the chain cursor
    #[error("border moved backward: x={x} is behind cursor {cursor}")]
    Backward { x: i32, cursor: i32 },
}

/// Invalid tuning data
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid gap range: min {min} must be positive and below max {max}")]
    GapRange { min: i32, max: i32 },

    #[error("invalid vertical band: {lo}..{hi}")]
    Band { lo: i32, hi: i32 },

    #[error("style weights must be non-negative with a positive sum")]
    Weights,

    #[error("invalid {name}: {value}")]
    OutOfRange { name: &'static str, value: f32 },
}
