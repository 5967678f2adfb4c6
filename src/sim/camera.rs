//! Camera tracking and background offset
//!
//! The camera follows the player horizontally (leading by its velocity) and
//! takes its height from the target registered by the current segment. The
//! result passes through a cascade of one-pole smoothing filters; the extra
//! lag the cascade introduces is compensated by leading the target further.

use glam::Vec2;

/// Filter cascade length
pub const FILTER_ORDER: usize = 3;
/// Fraction of the input remaining after one second, per filter stage
pub const FILTER_TIME: f32 = 0.001;

/// Where the camera should sit vertically
#[derive(Debug, Clone, PartialEq)]
pub enum CameraTarget {
    /// Constant height
    Fixed(f32),
    /// Height per integer x, starting at `x0`
    Path { x0: i32, ys: Vec<i16> },
}

impl Default for CameraTarget {
    fn default() -> Self {
        CameraTarget::Fixed(0.0)
    }
}

impl CameraTarget {
    /// Target height at `x`; path lookups clamp to the nearest end
    pub fn y_at(&self, x: f32) -> f32 {
        match self {
            CameraTarget::Fixed(y) => *y,
            CameraTarget::Path { x0, ys } => {
                let Some(last) = ys.len().checked_sub(1) else {
                    return 0.0;
                };
                let idx = (x.floor() as i64 - *x0 as i64).clamp(0, last as i64) as usize;
                ys[idx] as f32
            }
        }
    }
}

/// Cascade of exponential smoothing stages
#[derive(Debug, Clone)]
struct SmoothingFilter {
    coeff: f32,
    data: Vec<Vec2>,
    pos: Vec2,
    /// Lead time (s) that cancels the cascade's lag
    leading: f32,
}

impl SmoothingFilter {
    fn new(order: usize, time: f32, rate: f32) -> Self {
        let coeff = time.powf(1.0 / rate);
        Self {
            coeff,
            data: vec![Vec2::ZERO; order],
            pos: Vec2::ZERO,
            leading: order as f32 * coeff / ((1.0 - coeff) * rate),
        }
    }

    fn reset(&mut self, pos: Vec2) {
        self.data.iter_mut().for_each(|d| *d = pos);
        self.pos = pos;
    }

    fn update(&mut self, input: Vec2) {
        let mut v = input;
        for stage in self.data.iter_mut() {
            v = v * (1.0 - self.coeff) + *stage * self.coeff;
            *stage = v;
        }
        self.pos = v;
    }

    fn shift(&mut self, offset: Vec2) {
        self.data.iter_mut().for_each(|d| *d += offset);
        self.pos += offset;
    }
}

/// Smoothed camera following the player along the segment's path
#[derive(Debug, Clone)]
pub struct Camera {
    target: CameraTarget,
    /// Horizontal offset of the view centre ahead of the player
    pub offset_x: f32,
    filter: SmoothingFilter,
    pos0: Vec2,
    pos1: Vec2,
    /// Interpolated position of the last `update`
    pub pos: Vec2,
}

impl Camera {
    /// Camera stepped at `rate` Hz
    pub fn new(rate: f32) -> Self {
        Self {
            target: CameraTarget::default(),
            offset_x: 4.0,
            filter: SmoothingFilter::new(FILTER_ORDER, FILTER_TIME, rate),
            pos0: Vec2::ZERO,
            pos1: Vec2::ZERO,
            pos: Vec2::ZERO,
        }
    }

    pub fn set_target(&mut self, target: CameraTarget) {
        self.target = target;
    }

    pub fn target(&self) -> &CameraTarget {
        &self.target
    }

    fn desired(&self, tracked: Vec2, velocity: Vec2) -> Vec2 {
        let x = tracked.x + velocity.x * self.filter.leading + self.offset_x;
        Vec2::new(x, self.target.y_at(x))
    }

    /// Jump straight to the tracked position, dropping filter history
    pub fn reset(&mut self, tracked: Vec2, velocity: Vec2) {
        let p = self.desired(tracked, velocity);
        self.filter.reset(p);
        self.pos0 = p;
        self.pos1 = p;
        self.pos = p;
    }

    /// Advance one simulation step
    pub fn step(&mut self, tracked: Vec2, velocity: Vec2) {
        self.pos0 = self.pos1;
        let p = self.desired(tracked, velocity);
        self.filter.update(p);
        self.pos1 = self.filter.pos;
    }

    /// Interpolate between the last two steps for rendering
    pub fn update(&mut self, frac: f32) -> Vec2 {
        self.pos = self.pos0.lerp(self.pos1, frac.clamp(0.0, 1.0));
        self.pos
    }

    /// Shift all internal state into a rebased frame
    pub fn add_offset(&mut self, offset: Vec2) {
        self.filter.shift(offset);
        self.pos0 += offset;
        self.pos1 += offset;
        self.pos += offset;
    }
}

/// Parallax background; keeps its pattern fixed across rebasing
#[derive(Debug, Clone, Default)]
pub struct Background {
    offset: Vec2,
    pub pos: Vec2,
}

impl Background {
    pub fn update(&mut self, camera_pos: Vec2) {
        self.pos = camera_pos + self.offset;
    }

    /// Cancel a world shift so the pattern doesn't jump
    pub fn add_offset(&mut self, offset: Vec2) {
        self.offset -= offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_lookup_clamps() {
        let t = CameraTarget::Path {
            x0: 10,
            ys: vec![1, 2, 3],
        };
        assert_eq!(t.y_at(-50.0), 1.0);
        assert_eq!(t.y_at(11.5), 2.0);
        assert_eq!(t.y_at(500.0), 3.0);
        assert_eq!(CameraTarget::Fixed(4.0).y_at(123.0), 4.0);
    }

    #[test]
    fn test_camera_converges_on_fixed_target() {
        let mut cam = Camera::new(60.0);
        cam.offset_x = 0.0;
        cam.set_target(CameraTarget::Fixed(5.0));
        cam.reset(Vec2::ZERO, Vec2::ZERO);
        for _ in 0..600 {
            cam.step(Vec2::new(20.0, -3.0), Vec2::ZERO);
        }
        let p = cam.update(1.0);
        assert!((p.x - 20.0).abs() < 0.01);
        assert!((p.y - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_add_offset_moves_without_lag() {
        let mut cam = Camera::new(60.0);
        cam.set_target(CameraTarget::Fixed(0.0));
        cam.reset(Vec2::new(100.0, 0.0), Vec2::ZERO);
        let before = cam.update(0.5);
        cam.add_offset(Vec2::new(-100.0, 2.0));
        assert_eq!(cam.update(0.5), before + Vec2::new(-100.0, 2.0));
    }

    #[test]
    fn test_background_cancels_offset() {
        let mut bg = Background::default();
        bg.update(Vec2::new(50.0, 0.0));
        let before = bg.pos;
        bg.add_offset(Vec2::new(-50.0, 0.0));
        bg.update(Vec2::new(0.0, 0.0));
        assert_eq!(bg.pos, before);
    }
}
