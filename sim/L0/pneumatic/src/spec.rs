//! Cylinder and environment configuration.

use sim_suspension::{CylinderKinematics, DeadZone, GeometryState};
use sim_thermo::{
    FlowConditions, GasProperties, VolumeProcess, STANDARD_ATMOSPHERE, STANDARD_TEMPERATURE,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PneumaticError;
use crate::Result;

/// Configuration of a pneumatic cylinder and its initial charge.
///
/// # Example
///
/// ```
/// use sim_pneumatic::CylinderSpec;
/// use sim_suspension::DeadZone;
///
/// let spec = CylinderSpec::new(0.08, 0.035, 0.30, 0.02)
///     .with_dead_zones(DeadZone::Length(0.002), DeadZone::Length(0.002))
///     .with_precharge(400_000.0, 293.15);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CylinderSpec {
    /// Bore, rod, body, piston and dead zones.
    pub dimensions: CylinderKinematics,
    /// Working gas.
    pub gas: GasProperties,
    /// How chamber gas responds to volume changes.
    pub process: VolumeProcess,
    /// Initial absolute pressure in both chambers (Pa).
    pub precharge_pressure: f64,
    /// Initial gas temperature (K).
    pub precharge_temperature: f64,
    /// Initial stroke (m); mid-travel when unset.
    pub initial_stroke: Option<f64>,
}

impl Default for CylinderSpec {
    fn default() -> Self {
        Self {
            dimensions: CylinderKinematics::default(),
            gas: GasProperties::air(),
            process: VolumeProcess::Adiabatic,
            precharge_pressure: 300_000.0,
            precharge_temperature: STANDARD_TEMPERATURE,
            initial_stroke: None,
        }
    }
}

impl CylinderSpec {
    /// Create a spec with the given dimensions and no dead zones.
    #[must_use]
    pub fn new(
        bore_diameter: f64,
        rod_diameter: f64,
        body_length: f64,
        piston_thickness: f64,
    ) -> Self {
        Self {
            dimensions: CylinderKinematics::new(
                bore_diameter,
                rod_diameter,
                body_length,
                piston_thickness,
            ),
            ..Self::default()
        }
    }

    /// Take the cylinder dimensions from a suspension geometry.
    #[must_use]
    pub fn from_geometry(geometry: &GeometryState) -> Self {
        Self {
            dimensions: geometry.cylinder(),
            ..Self::default()
        }
    }

    /// Set the dead zones (rod end, head end).
    #[must_use]
    pub fn with_dead_zones(mut self, rod: DeadZone, head: DeadZone) -> Self {
        self.dimensions = self.dimensions.with_dead_zones(rod, head);
        self
    }

    /// Set the working gas.
    #[must_use]
    pub fn with_gas(mut self, gas: GasProperties) -> Self {
        self.gas = gas;
        self
    }

    /// Set the volume-change process.
    #[must_use]
    pub fn with_process(mut self, process: VolumeProcess) -> Self {
        self.process = process;
        self
    }

    /// Set the initial charge.
    #[must_use]
    pub fn with_precharge(mut self, pressure: f64, temperature: f64) -> Self {
        self.precharge_pressure = pressure;
        self.precharge_temperature = temperature;
        self
    }

    /// Set the initial stroke.
    #[must_use]
    pub fn with_initial_stroke(mut self, stroke: f64) -> Self {
        self.initial_stroke = Some(stroke);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::Kinematics`] for invalid dimensions (including
    /// a degenerate stroke range), [`PneumaticError::Thermo`] for invalid gas
    /// properties, and [`PneumaticError::InvalidConfig`] for a bad charge.
    pub fn validate(&self) -> Result<()> {
        self.dimensions.validate()?;
        self.gas.validate()?;
        if !self.precharge_pressure.is_finite() || self.precharge_pressure <= 0.0 {
            return Err(PneumaticError::invalid_config(format!(
                "precharge pressure must be positive, got {}",
                self.precharge_pressure
            )));
        }
        if !self.precharge_temperature.is_finite() || self.precharge_temperature <= 0.0 {
            return Err(PneumaticError::invalid_config(format!(
                "precharge temperature must be positive, got {}",
                self.precharge_temperature
            )));
        }
        if let Some(stroke) = self.initial_stroke {
            if !stroke.is_finite() {
                return Err(PneumaticError::NonFiniteInput {
                    name: "initial_stroke",
                    value: stroke,
                });
            }
        }
        Ok(())
    }
}

/// The atmosphere that exhaust ports vent to.
///
/// Treated as an infinite reservoir: venting into it or drawing from it never
/// changes its state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AmbientConditions {
    /// Absolute pressure (Pa).
    pub pressure: f64,
    /// Temperature (K).
    pub temperature: f64,
}

impl Default for AmbientConditions {
    fn default() -> Self {
        Self {
            pressure: STANDARD_ATMOSPHERE,
            temperature: STANDARD_TEMPERATURE,
        }
    }
}

impl AmbientConditions {
    /// Create ambient conditions.
    #[must_use]
    pub const fn new(pressure: f64, temperature: f64) -> Self {
        Self {
            pressure,
            temperature,
        }
    }

    /// Conditions as seen by an orifice.
    #[must_use]
    pub const fn conditions(&self) -> FlowConditions {
        FlowConditions::new(self.pressure, self.temperature)
    }

    /// Validate the conditions.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidConfig`] for non-positive values.
    pub fn validate(&self) -> Result<()> {
        if self.pressure.is_finite()
            && self.pressure > 0.0
            && self.temperature.is_finite()
            && self.temperature > 0.0
        {
            Ok(())
        } else {
            Err(PneumaticError::invalid_config(format!(
                "ambient conditions must be positive, got {} Pa / {} K",
                self.pressure, self.temperature
            )))
        }
    }
}
