//! Generation and movement tuning
//!
//! Loaded once at startup from JSON; every field falls back to the
//! compiled-in constant when missing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Level style weights for the style picker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleWeights {
    pub open: f32,
    pub medium: f32,
    pub closed: f32,
}

impl Default for StyleWeights {
    fn default() -> Self {
        Self {
            open: 1.0,
            medium: 1.0,
            closed: 2.0,
        }
    }
}

impl StyleWeights {
    pub fn total(&self) -> f32 {
        self.open + self.medium + self.closed
    }
}

/// Player movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub mass: f32,
    pub drag: f32,
    /// Cruise speed the forward thrust balances against drag
    pub speed: f32,
    /// Jetpack thrust as a multiple of gravity
    pub jetpack: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            mass: PLAYER_MASS,
            drag: PLAYER_DRAG,
            speed: PLAYER_SPEED,
            jetpack: PLAYER_JETPACK,
        }
    }
}

/// All tunable parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Corridor shape ===
    pub min_gap: i32,
    pub max_gap: i32,
    pub band_lo: i32,
    pub band_hi: i32,
    pub step_width: i32,
    pub buffer_width: i32,
    pub passage: i32,
    /// Probability that a shrink/grow happens in one abrupt step
    pub sudden_chance: f32,

    // === Content ===
    pub styles: StyleWeights,

    // === Handoff ===
    pub retain_window: f32,

    // === Physics ===
    pub gravity: f32,
    pub player: PlayerTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_gap: MIN_GAP,
            max_gap: MAX_GAP,
            band_lo: BAND_LO,
            band_hi: BAND_HI,
            step_width: STEP_WIDTH,
            buffer_width: BUFFER_WIDTH,
            passage: PASSAGE,
            sudden_chance: 0.3,

            styles: StyleWeights::default(),

            retain_window: RETAIN_WINDOW,

            gravity: GRAVITY,
            player: PlayerTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate tuning JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.min_gap <= 0 || self.min_gap >= self.max_gap {
            return Err(TuningError::GapRange {
                min: self.min_gap,
                max: self.max_gap,
            });
        }
        if self.band_lo >= self.band_hi {
            return Err(TuningError::Band {
                lo: self.band_lo,
                hi: self.band_hi,
            });
        }
        let w = &self.styles;
        if w.open < 0.0 || w.medium < 0.0 || w.closed < 0.0 || w.total() <= 0.0 {
            return Err(TuningError::Weights);
        }
        if !(0.0..=1.0).contains(&self.sudden_chance) {
            return Err(TuningError::OutOfRange {
                name: "sudden_chance",
                value: self.sudden_chance,
            });
        }
        for (name, value) in [
            ("step_width", self.step_width as f32),
            ("buffer_width", self.buffer_width as f32),
            ("passage", self.passage as f32),
            ("player.mass", self.player.mass),
        ] {
            if value <= 0.0 {
                return Err(TuningError::OutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Gap span between the clearance bounds
    #[inline]
    pub fn gap_span(&self) -> i32 {
        self.max_gap - self.min_gap
    }

    /// Player jetpack thrust (force units)
    pub fn jet_force(&self) -> f32 {
        self.player.mass * self.gravity * self.player.jetpack
    }

    /// Forward thrust that balances drag at cruise speed
    pub fn forward_force(&self) -> f32 {
        self.player.speed * self.player.speed * self.player.drag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "min_gap": 10, "styles": { "open": 0.0 } }"#).unwrap();
        assert_eq!(tuning.min_gap, 10);
        assert_eq!(tuning.max_gap, MAX_GAP);
        assert_eq!(tuning.styles.open, 0.0);
        assert_eq!(tuning.styles.closed, StyleWeights::default().closed);
    }

    #[test]
    fn test_inverted_gap_rejected() {
        let err = Tuning::from_json(r#"{ "min_gap": 40, "max_gap": 20 }"#).unwrap_err();
        assert!(matches!(err, TuningError::GapRange { min: 40, max: 20 }));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let json = r#"{ "styles": { "open": 0.0, "medium": 0.0, "closed": 0.0 } }"#;
        assert!(matches!(Tuning::from_json(json), Err(TuningError::Weights)));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }
}
