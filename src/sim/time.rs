//! Fixed timestep frame clock
//!
//! Converts variable real frame times into a whole number of simulation
//! steps plus the fraction used to interpolate rendering between the last
//! two simulated states.

use crate::consts::{MAX_SUBSTEPS, MAX_UPDATE_INTERVAL, SIM_DT};

#[derive(Debug, Clone)]
pub struct FrameClock {
    dt: f32,
    accumulator: f32,
    frac: f32,
    max_substeps: u32,
    max_interval: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(SIM_DT)
    }
}

impl FrameClock {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            frac: 0.0,
            max_substeps: MAX_SUBSTEPS,
            max_interval: MAX_UPDATE_INTERVAL,
        }
    }

    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Interpolation fraction between the previous and current step
    #[inline]
    pub fn frac(&self) -> f32 {
        self.frac
    }

    /// Add `real_dt` seconds of real time; returns how many steps to run
    ///
    /// After a long stall (tab in background, debugger) the backlog is
    /// dropped and a single step runs instead of replaying it.
    pub fn advance(&mut self, real_dt: f32) -> u32 {
        let real_dt = real_dt.max(0.0);
        if real_dt > self.max_interval {
            log::debug!("Skipping {:.2}s of lag", real_dt);
            self.accumulator = 0.0;
            self.frac = 1.0;
            return 1;
        }

        self.accumulator += real_dt;
        let mut steps = 0;
        while self.accumulator >= self.dt && steps < self.max_substeps {
            self.accumulator -= self.dt;
            steps += 1;
        }
        if steps == self.max_substeps && self.accumulator >= self.dt {
            // spiral of death guard
            self.accumulator = 0.0;
        }
        self.frac = (self.accumulator / self.dt).clamp(0.0, 1.0);
        steps
    }
}
