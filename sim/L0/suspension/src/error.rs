//! Error types for suspension kinematics.

use thiserror::Error;

/// Errors that can occur when solving or configuring suspension geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinematicsError {
    /// The cylinder cannot be built: its usable stroke range is empty.
    #[error("degenerate geometry: stroke range [{x_min}, {x_max}] is empty ({reason})")]
    DegenerateGeometry {
        /// Lower stroke bound (m).
        x_min: f64,
        /// Upper stroke bound before clamping (m).
        x_max: f64,
        /// Which dimension made the range empty.
        reason: String,
    },

    /// An input was NaN or infinite.
    #[error("non-finite input: {name} = {value}")]
    NonFiniteInput {
        /// Name of the input.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A dimension is out of its physical domain.
    #[error("invalid dimension: {name} = {value} ({reason})")]
    InvalidDimension {
        /// Name of the dimension.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A geometry parameter name was not recognised.
    #[error("unknown geometry parameter: {0}")]
    UnknownParameter(String),
}

impl KinematicsError {
    /// Create a degenerate geometry error.
    #[must_use]
    pub fn degenerate(x_min: f64, x_max: f64, reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            x_min,
            x_max,
            reason: reason.into(),
        }
    }

    /// Create a non-finite input error.
    #[must_use]
    pub const fn non_finite(name: &'static str, value: f64) -> Self {
        Self::NonFiniteInput { name, value }
    }

    /// Create an invalid dimension error.
    #[must_use]
    pub const fn invalid_dimension(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidDimension {
            name,
            value,
            reason,
        }
    }

    /// Check if this is a degenerate geometry error.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateGeometry { .. })
    }
}
