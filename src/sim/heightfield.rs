//! Per-column height samples and the camera path derived from them
//!
//! The camera follows the middle of the corridor, but the raw middle jumps
//! at every step in the terrain. Eroding the floor (running minimum) and
//! dilating the ceiling (running maximum) before averaging smooths out
//! features narrower than the filter window.
//!
//! The filter is a forward doubling scheme: pass `i` folds in the sample
//! `2^i` ahead, so after five passes each sample covers the next 32. It only
//! looks ahead, not behind, which biases the path toward upcoming terrain.

use super::border::BorderChain;
use super::camera::CameraTarget;
use crate::floor_mid;

/// Number of doubling passes (window of `2^PASSES` samples)
pub const PASSES: u32 = 5;

/// Dense heights for integer x in `[x0, x0 + len)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightField {
    pub x0: i32,
    pub data: Vec<i16>,
}

impl HeightField {
    /// Sample a chain at every integer x in `[x0, x1)`
    ///
    /// Columns the chain doesn't cover take the nearest run's height.
    pub fn sample(chain: &BorderChain, x0: i32, x1: i32) -> Self {
        let len = (x1 - x0).max(0) as usize;
        let mut data = Vec::with_capacity(len);
        let mut last = chain.runs().first().map_or(chain.y(), |r| r.y);
        for x in x0..x1 {
            if let Some(y) = chain.height_at(x) {
                last = y;
            }
            data.push(to_i16(last));
        }
        Self { x0, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: i32) -> Option<i16> {
        let idx = usize::try_from(x - self.x0).ok()?;
        self.data.get(idx).copied()
    }

    pub fn eroded(mut self) -> Self {
        erode(&mut self.data);
        self
    }

    pub fn dilated(mut self) -> Self {
        dilate(&mut self.data);
        self
    }
}

#[inline]
fn to_i16(y: i32) -> i16 {
    y.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn doubling_filter(a: &mut [i16], pick: fn(i16, i16) -> i16) {
    let len = a.len();
    for i in 0..PASSES {
        let n = 1usize << i;
        if n >= len {
            break;
        }
        // Ascending j reads a[j + n] before this pass touches it
        for j in 0..len - n {
            a[j] = pick(a[j], a[j + n]);
        }
    }
}

/// Forward running minimum, in place
pub fn erode(a: &mut [i16]) {
    doubling_filter(a, std::cmp::min);
}

/// Forward running maximum, in place
pub fn dilate(a: &mut [i16]) {
    doubling_filter(a, std::cmp::max);
}

/// Camera target from a finished segment's floor and ceiling
pub fn camera_path(floor: &BorderChain, ceiling: &BorderChain, x0: i32, x1: i32) -> CameraTarget {
    let lo = HeightField::sample(floor, x0, x1).eroded();
    let hi = HeightField::sample(ceiling, x0, x1).dilated();

    let ys: Vec<i16> = lo
        .data
        .iter()
        .zip(&hi.data)
        .map(|(&f, &c)| to_i16(floor_mid(f as i32, c as i32)))
        .collect();

    match ys.first() {
        None => CameraTarget::Fixed(floor_mid(floor.y(), ceiling.y()) as f32),
        Some(&first) if ys.iter().all(|&y| y == first) => CameraTarget::Fixed(first as f32),
        Some(_) => CameraTarget::Path { x0, ys },
    }
}
