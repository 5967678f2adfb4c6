//! Dash Corridor - an endless side-scrolling jetpack corridor
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain generation, segment handoff, entities)
//! - `tuning`: Data-driven generation and movement balance
//! - `error`: Typed errors for rejected border edits and bad tuning files

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{BorderError, TuningError};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Simulation steps per second
    pub const SIM_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / SIM_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Real time gap (seconds) after which missed steps are skipped instead of replayed
    pub const MAX_UPDATE_INTERVAL: f32 = 0.5;

    /// Downward acceleration, units/s²
    pub const GRAVITY: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_MASS: f32 = 5.0;
    pub const PLAYER_DRAG: f32 = 0.5;
    pub const PLAYER_SPEED: f32 = 25.0;
    /// Jetpack thrust as a multiple of gravity
    pub const PLAYER_JETPACK: f32 = 2.0;
    pub const PLAYER_RADIUS: f32 = 1.0;

    /// Vertical clearance bounds between floor and ceiling
    pub const MIN_GAP: i32 = 12;
    pub const MAX_GAP: i32 = 32;
    /// Soft vertical band the corridor centre is nudged to stay inside
    pub const BAND_LO: i32 = -30;
    pub const BAND_HI: i32 = 30;

    /// Base width of one border growth step
    pub const STEP_WIDTH: i32 = 6;
    /// Width of the seam runs at either end of a segment
    pub const BUFFER_WIDTH: i32 = 16;
    /// Minimum free space left around obstacles
    pub const PASSAGE: i32 = 4;
    /// Iteration cap for closed-style generation
    pub const MAX_CLOSED_ITERATIONS: u32 = 100;

    /// Widest decorative tile column
    pub const TILE_WIDTH: i32 = 4;
    /// Thickness of the baseline floor/ceiling volumes
    pub const VOLUME_DEPTH: i32 = 8;
    /// Thickness of the vertical seam walls
    pub const SEAM_WALL_THICKNESS: f32 = 1.0;

    /// Distance from the exit buffer within which entities survive a transition
    pub const RETAIN_WINDOW: f32 = 6.0;

    /// Visible world height
    pub const FOV_Y: f32 = 18.0;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Integer midpoint rounded toward negative infinity
#[inline]
pub fn floor_mid(a: i32, b: i32) -> i32 {
    (a + b).div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_mid_rounds_down() {
        assert_eq!(floor_mid(-16, 16), 0);
        assert_eq!(floor_mid(-3, 0), -2);
        assert_eq!(floor_mid(3, 0), 1);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 10.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(2.0, 10.0, 0.5), 6.0);
    }
}
