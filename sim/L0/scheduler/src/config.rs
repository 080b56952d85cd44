//! Scheduler timing configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::Result;

/// Timing limits for the fixed-step loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SchedulerConfig {
    /// Fixed simulation timestep (seconds).
    pub dt: f64,
    /// Most steps a single tick may execute.
    pub max_steps_per_tick: u32,
    /// Backlog (seconds) above which unexecuted time is dropped.
    pub max_frame_time: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dt: 0.001, // 1 kHz
            max_steps_per_tick: 100,
            max_frame_time: 0.25,
        }
    }
}

impl SchedulerConfig {
    /// Create a config with the given timestep and default limits.
    #[must_use]
    pub fn with_timestep(dt: f64) -> Self {
        Self {
            dt,
            ..Default::default()
        }
    }

    /// Interactive use at 1 kHz with a tight catch-up budget.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            dt: 0.001,
            max_steps_per_tick: 50,
            max_frame_time: 0.1,
        }
    }

    /// 10 kHz for fast valve transients.
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self {
            dt: 1.0e-4,
            max_steps_per_tick: 1000,
            max_frame_time: 0.25,
        }
    }

    /// Offline runs that never drop time.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            dt: 0.001,
            max_steps_per_tick: u32::MAX,
            max_frame_time: f64::MAX,
        }
    }

    /// Set the step budget per tick.
    #[must_use]
    pub fn max_steps_per_tick(mut self, steps: u32) -> Self {
        self.max_steps_per_tick = steps;
        self
    }

    /// Set the backlog limit.
    #[must_use]
    pub fn max_frame_time(mut self, seconds: f64) -> Self {
        self.max_frame_time = seconds;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for a non-positive timestep,
    /// a zero step budget, or a backlog limit shorter than one step.
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SchedulerError::invalid_config(format!(
                "timestep must be positive, got {}",
                self.dt
            )));
        }
        if self.dt > 1.0 {
            return Err(SchedulerError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }
        if self.max_steps_per_tick == 0 {
            return Err(SchedulerError::invalid_config(
                "max_steps_per_tick must be at least 1",
            ));
        }
        if self.max_frame_time.is_nan() || self.max_frame_time < self.dt {
            return Err(SchedulerError::invalid_config(format!(
                "max_frame_time {} is shorter than one step",
                self.max_frame_time
            )));
        }
        Ok(())
    }

    /// Step frequency (Hz).
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }
}
