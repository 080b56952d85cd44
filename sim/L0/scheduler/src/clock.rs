//! Fixed-timestep accumulator clock.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;

/// Relative slack on the step-due test. Absorbs the rounding left by
/// repeated subtraction of `dt`.
const STEP_TOLERANCE: f64 = 1e-9;

/// Accumulates wall time and hands it out in fixed `dt` steps.
///
/// ```text
/// tick(elapsed):  accumulated += elapsed
///                 while accumulated >= dt and steps < max_steps_per_tick:
///                     step; accumulated -= dt
///                 if budget exhausted and accumulated > max_frame_time:
///                     drop all of accumulated
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationClock {
    dt: f64,
    accumulated_time: f64,
    step_count: u64,
    max_steps_per_tick: u32,
    max_frame_time: f64,
    sim_time: f64,
    discarded_time: f64,
}

impl SimulationClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            dt: config.dt,
            accumulated_time: 0.0,
            step_count: 0,
            max_steps_per_tick: config.max_steps_per_tick,
            max_frame_time: config.max_frame_time,
            sim_time: 0.0,
            discarded_time: 0.0,
        }
    }

    /// Fixed timestep (s).
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Wall time waiting to be simulated (s).
    #[must_use]
    pub const fn accumulated_time(&self) -> f64 {
        self.accumulated_time
    }

    /// Steps executed since creation or reset.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Step budget per tick.
    #[must_use]
    pub const fn max_steps_per_tick(&self) -> u32 {
        self.max_steps_per_tick
    }

    /// Backlog limit (s).
    #[must_use]
    pub const fn max_frame_time(&self) -> f64 {
        self.max_frame_time
    }

    /// Simulated time (s).
    #[must_use]
    pub const fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Total wall time dropped by overloads (s).
    #[must_use]
    pub const fn discarded_time(&self) -> f64 {
        self.discarded_time
    }

    /// Simulated time at the end of the next step (s).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn next_time(&self) -> f64 {
        (self.step_count + 1) as f64 * self.dt
    }

    /// Add elapsed wall time.
    pub fn accumulate(&mut self, elapsed: f64) {
        self.accumulated_time += elapsed;
    }

    /// Whether at least one `dt` is waiting.
    #[must_use]
    pub fn step_due(&self) -> bool {
        self.accumulated_time >= self.dt * (1.0 - STEP_TOLERANCE)
    }

    /// Consume one `dt` after a completed step.
    pub fn advance(&mut self) {
        self.accumulated_time = (self.accumulated_time - self.dt).max(0.0);
        self.step_count += 1;
        self.sim_time = self.current_time();
    }

    /// Drop the whole backlog if it exceeds `max_frame_time`.
    ///
    /// Returns the dropped time.
    pub fn discard_excess(&mut self) -> Option<f64> {
        if self.accumulated_time > self.max_frame_time {
            let dropped = self.accumulated_time;
            self.accumulated_time = 0.0;
            self.discarded_time += dropped;
            Some(dropped)
        } else {
            None
        }
    }

    /// Drop the backlog without counting it as an overload.
    pub fn clear_backlog(&mut self) {
        self.accumulated_time = 0.0;
    }

    /// Back to time zero.
    pub fn reset(&mut self) {
        self.accumulated_time = 0.0;
        self.step_count = 0;
        self.sim_time = 0.0;
        self.discarded_time = 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    fn current_time(&self) -> f64 {
        self.step_count as f64 * self.dt
    }
}
