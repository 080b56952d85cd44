//! Error types for the scheduler.

use sim_pneumatic::PneumaticError;
use sim_suspension::KinematicsError;
use thiserror::Error;

use crate::scheduler::SchedulerState;

/// Errors that can occur when configuring or running the scheduler.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    /// A lifecycle request is not allowed from the current state.
    #[error("cannot go from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: SchedulerState,
        /// Requested state.
        to: SchedulerState,
    },

    /// A cylinder failed to build or step.
    #[error("pneumatic error: {0}")]
    Pneumatic(#[from] PneumaticError),

    /// The suspension geometry could not be solved.
    #[error("kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A command named a cylinder the scheduler does not drive.
    #[error("unknown cylinder '{0}'")]
    UnknownCylinder(String),

    /// A corner with this cylinder name already exists.
    #[error("duplicate cylinder '{0}'")]
    DuplicateCylinder(String),

    /// Elapsed wall time was negative or non-finite.
    #[error("invalid elapsed time: {0}")]
    InvalidElapsed(f64),

    /// The worker thread is gone.
    #[error("scheduler worker disconnected")]
    WorkerDisconnected,
}

impl SchedulerError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Create an invalid transition error.
    #[must_use]
    pub const fn invalid_transition(from: SchedulerState, to: SchedulerState) -> Self {
        Self::InvalidTransition { from, to }
    }

    /// Check if this is a lifecycle error.
    #[must_use]
    pub const fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
