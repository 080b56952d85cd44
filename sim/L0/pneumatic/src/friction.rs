//! Seal friction.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PneumaticError;
use crate::Result;

/// Coulomb plus viscous seal friction with a stiction band.
///
/// ```text
/// |v| >  v_s:  F = sign(v) * F_c + c * v
/// |v| <= v_s:  F = clamp(F_applied, -F_c, F_c)
/// ```
///
/// Inside the stiction band the seal holds the piston against the applied
/// pressure force up to the Coulomb limit. The returned force resists motion:
/// it is subtracted from the pressure force.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrictionModel {
    /// Coulomb friction force (N).
    pub coulomb: f64,
    /// Viscous friction coefficient (N·s/m).
    pub viscous: f64,
    /// Speed below which the seal sticks (m/s).
    pub stiction_velocity: f64,
}

impl Default for FrictionModel {
    fn default() -> Self {
        Self::new(5.0, 50.0)
    }
}

impl FrictionModel {
    /// Create a friction model with the default stiction band.
    #[must_use]
    pub fn new(coulomb: f64, viscous: f64) -> Self {
        Self {
            coulomb: coulomb.abs(),
            viscous: viscous.abs(),
            stiction_velocity: 1e-6,
        }
    }

    /// Frictionless seals.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Preset for a large suspension strut with lip seals.
    #[must_use]
    pub fn suspension_strut() -> Self {
        Self::new(40.0, 400.0)
    }

    /// Set the stiction band.
    #[must_use]
    pub fn with_stiction_velocity(mut self, velocity: f64) -> Self {
        self.stiction_velocity = velocity.abs();
        self
    }

    /// Friction force at `velocity`, given the pressure force it opposes.
    #[must_use]
    pub fn force(&self, velocity: f64, applied_force: f64) -> f64 {
        if velocity.abs() > self.stiction_velocity {
            velocity.signum().mul_add(self.coulomb, self.viscous * velocity)
        } else {
            applied_force.clamp(-self.coulomb, self.coulomb)
        }
    }

    /// Validate the coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidConfig`] for negative or non-finite
    /// coefficients.
    pub fn validate(&self) -> Result<()> {
        let ok = [self.coulomb, self.viscous, self.stiction_velocity]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if ok {
            Ok(())
        } else {
            Err(PneumaticError::invalid_config(format!(
                "friction coefficients must be non-negative: {self:?}"
            )))
        }
    }
}
