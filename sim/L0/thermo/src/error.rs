//! Error types for gas state operations.

use thiserror::Error;

/// Errors that can occur when mutating a gas state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThermoError {
    /// Volume must be positive and finite.
    #[error("invalid volume: {volume} m³ (must be positive and finite)")]
    InvalidVolume {
        /// The rejected volume.
        volume: f64,
    },

    /// Mass must be non-negative and finite (positive for a charge).
    #[error("invalid mass: {mass} kg ({reason})")]
    InvalidMass {
        /// The rejected mass.
        mass: f64,
        /// Why the mass was rejected.
        reason: &'static str,
    },

    /// Temperature must be positive and finite.
    #[error("invalid temperature: {temperature} K (must be positive and finite)")]
    InvalidTemperature {
        /// The rejected temperature.
        temperature: f64,
    },

    /// Gas species constants are unusable.
    #[error("invalid gas properties: {reason}")]
    InvalidProperties {
        /// Description of what's wrong.
        reason: String,
    },
}

impl ThermoError {
    /// Create an invalid volume error.
    #[must_use]
    pub const fn invalid_volume(volume: f64) -> Self {
        Self::InvalidVolume { volume }
    }

    /// Create an invalid mass error.
    #[must_use]
    pub const fn invalid_mass(mass: f64, reason: &'static str) -> Self {
        Self::InvalidMass { mass, reason }
    }

    /// Create an invalid temperature error.
    #[must_use]
    pub const fn invalid_temperature(temperature: f64) -> Self {
        Self::InvalidTemperature { temperature }
    }

    /// Create an invalid gas properties error.
    #[must_use]
    pub fn invalid_properties(reason: impl Into<String>) -> Self {
        Self::InvalidProperties {
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by a bad volume.
    #[must_use]
    pub const fn is_volume_error(&self) -> bool {
        matches!(self, Self::InvalidVolume { .. })
    }

    /// Check if this error was caused by a bad mass.
    #[must_use]
    pub const fn is_mass_error(&self) -> bool {
        matches!(self, Self::InvalidMass { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ThermoError::invalid_volume(-1.0);
        assert!(err.to_string().contains("-1"));

        let err = ThermoError::invalid_mass(-0.5, "negative injection");
        assert!(err.to_string().contains("negative injection"));

        let err = ThermoError::invalid_properties("gamma must exceed 1");
        assert!(err.to_string().contains("gamma"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(ThermoError::invalid_volume(0.0).is_volume_error());
        assert!(!ThermoError::invalid_volume(0.0).is_mass_error());
        assert!(ThermoError::invalid_mass(-1.0, "x").is_mass_error());
        assert!(!ThermoError::invalid_temperature(0.0).is_volume_error());
    }
}
