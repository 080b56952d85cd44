//! Error types for the pneumatic cylinder.

use sim_suspension::KinematicsError;
use sim_thermo::ThermoError;
use thiserror::Error;

/// Errors that can occur when building or stepping a pneumatic cylinder.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PneumaticError {
    /// A chamber gas operation failed.
    #[error("gas state error: {0}")]
    Thermo(#[from] ThermoError),

    /// The cylinder or lever geometry is invalid.
    #[error("kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    /// A lever angle was given to a cylinder without lever kinematics.
    #[error("cylinder '{cylinder}' has no kinematics provider for lever-angle drive")]
    MissingKinematics {
        /// Name of the cylinder.
        cylinder: String,
    },

    /// The timestep is not a positive finite number.
    #[error("invalid timestep: {0}")]
    InvalidTimestep(f64),

    /// A step input was NaN or infinite.
    #[error("non-finite input: {name} = {value}")]
    NonFiniteInput {
        /// Name of the input.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A valve port name does not exist on the cylinder.
    #[error("cylinder '{cylinder}' has no port named '{port}'")]
    UnknownPort {
        /// Name of the cylinder.
        cylinder: String,
        /// The requested port.
        port: String,
    },

    /// A valve port name is already taken, or the port cannot be connected.
    #[error("invalid port '{port}': {reason}")]
    InvalidPort {
        /// The offending port.
        port: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl PneumaticError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Create an unknown port error.
    #[must_use]
    pub fn unknown_port(cylinder: impl Into<String>, port: impl Into<String>) -> Self {
        Self::UnknownPort {
            cylinder: cylinder.into(),
            port: port.into(),
        }
    }

    /// Check if this error comes from an unbuildable cylinder geometry.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::Kinematics(e) if e.is_degenerate())
    }
}
