//! Compressible mass flow through a valve orifice.
//!
//! The model follows the standard isentropic nozzle relations. With the
//! downstream/upstream pressure ratio `r = p_down / p_up` and the critical
//! ratio
//!
//! ```text
//! r_crit = (2 / (γ + 1))^(γ / (γ - 1))          (≈ 0.528 for air)
//! ```
//!
//! the flow is either choked or subsonic:
//!
//! ```text
//! choked   (r <= r_crit):  ṁ = Cd·A·p_up·sqrt(γ / (R·T)) · (2 / (γ + 1))^((γ + 1) / (2(γ - 1)))
//! subsonic (r >  r_crit):  ṁ = Cd·A·p_up·sqrt(2γ / ((γ - 1)·R·T) · (r^(2/γ) - r^((γ + 1)/γ)))
//! ```
//!
//! Both branches agree at `r = r_crit`, so the rate is continuous in the
//! pressures.
//!
//! # Sign convention
//!
//! Rates are signed: positive means mass moves from the upstream side to the
//! downstream side. A [`FlowDirection::OneWay`] model never reports back-flow;
//! a [`FlowDirection::Bidirectional`] model reverses direction (negative rate)
//! when the downstream side holds the higher pressure.
//!
//! # Example
//!
//! ```
//! use sim_thermo::{GasProperties, ValveFlowModel};
//!
//! let model = ValveFlowModel::new(GasProperties::air());
//!
//! // Closed valve: exactly zero
//! assert_eq!(model.mass_flow_rate(600_000.0, 101_325.0, 293.15, 1e-6, 0.8, false), 0.0);
//!
//! // 6 bar into atmosphere is choked
//! assert!(model.is_choked(600_000.0, 101_325.0));
//! let rate = model.mass_flow_rate(600_000.0, 101_325.0, 293.15, 1e-6, 0.8, true);
//! assert!(rate > 0.0);
//! ```

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gas::GasProperties;
use crate::Result;

/// Pressure and temperature on one side of an orifice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowConditions {
    /// Absolute pressure (Pa).
    pub pressure: f64,
    /// Temperature (K).
    pub temperature: f64,
}

impl FlowConditions {
    /// Create flow conditions.
    #[must_use]
    pub const fn new(pressure: f64, temperature: f64) -> Self {
        Self {
            pressure,
            temperature,
        }
    }
}

/// Whether an orifice passes flow in one or both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlowDirection {
    /// Flow only from upstream to downstream (check valve behavior).
    #[default]
    OneWay,
    /// Flow follows the pressure gradient in either direction.
    Bidirectional,
}

/// Geometry of a flow restriction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Orifice {
    /// Geometric flow area (m²).
    pub area: f64,
    /// Discharge coefficient Cd (dimensionless, typically 0.6-0.9).
    pub discharge_coefficient: f64,
}

impl Orifice {
    /// Create an orifice from area and discharge coefficient.
    #[must_use]
    pub const fn new(area: f64, discharge_coefficient: f64) -> Self {
        Self {
            area,
            discharge_coefficient,
        }
    }

    /// Create a circular orifice from its diameter (m).
    #[must_use]
    pub fn from_diameter(diameter: f64, discharge_coefficient: f64) -> Self {
        Self::new(PI * diameter * diameter / 4.0, discharge_coefficient)
    }

    /// Effective flow area `Cd * A` (m²).
    #[must_use]
    pub fn effective_area(&self) -> f64 {
        self.area * self.discharge_coefficient
    }
}

impl Default for Orifice {
    fn default() -> Self {
        // 2 mm port, sharp-edged
        Self::from_diameter(0.002, 0.72)
    }
}

/// Compressible orifice flow for one gas species.
///
/// Serialized as its gas and direction; the flow coefficients are rebuilt
/// through [`ValveFlowModel::try_new`] on load.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "ValveFlowRecord", into = "ValveFlowRecord")
)]
pub struct ValveFlowModel {
    properties: GasProperties,
    direction: FlowDirection,
    critical_ratio: f64,
    choked_coefficient: f64,
}

#[cfg(feature = "serde")]
#[derive(Clone, Copy, Serialize, Deserialize)]
struct ValveFlowRecord {
    properties: GasProperties,
    direction: FlowDirection,
}

#[cfg(feature = "serde")]
impl From<ValveFlowModel> for ValveFlowRecord {
    fn from(model: ValveFlowModel) -> Self {
        Self {
            properties: model.properties,
            direction: model.direction,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<ValveFlowRecord> for ValveFlowModel {
    type Error = crate::ThermoError;

    fn try_from(record: ValveFlowRecord) -> Result<Self> {
        Ok(Self::try_new(record.properties)?.with_direction(record.direction))
    }
}

impl ValveFlowModel {
    /// Create a one-way flow model, validating the gas first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ThermoError::InvalidProperties`] if
    /// [`GasProperties::validate`] fails.
    pub fn try_new(properties: GasProperties) -> Result<Self> {
        properties.validate()?;
        Ok(Self::new(properties))
    }

    /// Create a one-way flow model for the given gas.
    ///
    /// `properties` must already be valid (`γ > 1`); otherwise the flow
    /// coefficients are NaN or infinite. Use [`ValveFlowModel::try_new`] for
    /// properties built from their public fields.
    #[must_use]
    pub fn new(properties: GasProperties) -> Self {
        let gamma = properties.specific_heat_ratio;
        let base = 2.0 / (gamma + 1.0);
        Self {
            properties,
            direction: FlowDirection::OneWay,
            critical_ratio: base.powf(gamma / (gamma - 1.0)),
            choked_coefficient: gamma.sqrt() * base.powf((gamma + 1.0) / (2.0 * (gamma - 1.0))),
        }
    }

    /// Set the flow direction behavior.
    #[must_use]
    pub const fn with_direction(mut self, direction: FlowDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Gas species constants.
    #[must_use]
    pub const fn properties(&self) -> &GasProperties {
        &self.properties
    }

    /// Configured flow direction.
    #[must_use]
    pub const fn direction(&self) -> FlowDirection {
        self.direction
    }

    /// Critical pressure ratio `(2 / (γ + 1))^(γ / (γ - 1))`.
    #[must_use]
    pub const fn critical_pressure_ratio(&self) -> f64 {
        self.critical_ratio
    }

    /// Check whether forward flow between these pressures is choked.
    #[must_use]
    pub fn is_choked(&self, p_upstream: f64, p_downstream: f64) -> bool {
        p_upstream > 0.0 && p_downstream / p_upstream <= self.critical_ratio
    }

    /// Mass flow rate through an orifice (kg/s).
    ///
    /// Returns exactly 0 when `is_open` is false. With a one-way model,
    /// `p_upstream <= p_downstream` also yields 0; a bidirectional model
    /// returns the reverse flow computed from the swapped pressures as a
    /// negative value. The reverse branch uses `temperature_upstream` as the
    /// source temperature; use [`ValveFlowModel::flow_between`] when both
    /// sides' temperatures are known.
    ///
    /// Degenerate input (non-positive area, discharge coefficient, pressure or
    /// temperature, or non-finite values) yields 0.
    #[must_use]
    pub fn mass_flow_rate(
        &self,
        p_upstream: f64,
        p_downstream: f64,
        temperature_upstream: f64,
        orifice_area: f64,
        discharge_coefficient: f64,
        is_open: bool,
    ) -> f64 {
        if !is_open {
            return 0.0;
        }
        let effective_area = orifice_area * discharge_coefficient;
        if p_upstream > p_downstream {
            self.forward_flow(p_upstream, p_downstream, temperature_upstream, effective_area)
        } else if self.direction == FlowDirection::Bidirectional && p_downstream > p_upstream {
            -self.forward_flow(p_downstream, p_upstream, temperature_upstream, effective_area)
        } else {
            0.0
        }
    }

    /// Mass flow rate from `source` to `sink` through `orifice` (kg/s).
    ///
    /// Same semantics as [`ValveFlowModel::mass_flow_rate`], but reverse flow
    /// is driven by the sink's own temperature.
    #[must_use]
    pub fn flow_between(
        &self,
        source: FlowConditions,
        sink: FlowConditions,
        orifice: &Orifice,
        is_open: bool,
    ) -> f64 {
        if !is_open {
            return 0.0;
        }
        let effective_area = orifice.effective_area();
        if source.pressure > sink.pressure {
            self.forward_flow(
                source.pressure,
                sink.pressure,
                source.temperature,
                effective_area,
            )
        } else if self.direction == FlowDirection::Bidirectional && sink.pressure > source.pressure
        {
            -self.forward_flow(
                sink.pressure,
                source.pressure,
                sink.temperature,
                effective_area,
            )
        } else {
            0.0
        }
    }

    /// Magnitude of flow from a higher to a lower pressure.
    fn forward_flow(
        &self,
        p_upstream: f64,
        p_downstream: f64,
        temperature_upstream: f64,
        effective_area: f64,
    ) -> f64 {
        let usable = [p_upstream, p_downstream, temperature_upstream, effective_area]
            .iter()
            .all(|v| v.is_finite());
        if !usable
            || effective_area <= 0.0
            || p_upstream <= 0.0
            || temperature_upstream <= 0.0
            || p_downstream >= p_upstream
        {
            return 0.0;
        }

        let r_t = self.properties.gas_constant * temperature_upstream;
        let ratio = (p_downstream / p_upstream).max(0.0);

        if ratio <= self.critical_ratio {
            effective_area * p_upstream * self.choked_coefficient / r_t.sqrt()
        } else {
            let gamma = self.properties.specific_heat_ratio;
            let flow_function =
                (ratio.powf(2.0 / gamma) - ratio.powf((gamma + 1.0) / gamma)).max(0.0);
            effective_area
                * p_upstream
                * (2.0 * gamma / ((gamma - 1.0) * r_t) * flow_function).sqrt()
        }
    }
}

impl Default for ValveFlowModel {
    fn default() -> Self {
        Self::new(GasProperties::air())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::gas::STANDARD_ATMOSPHERE;
    use crate::ThermoError;
    use approx::assert_relative_eq;

    const T: f64 = 293.15;
    const AREA: f64 = 1e-6;

    #[test]
    fn test_critical_ratio_air() {
        let model = ValveFlowModel::default();
        assert_relative_eq!(model.critical_pressure_ratio(), 0.528_28, epsilon = 1e-4);
    }

    #[test]
    fn test_closed_valve_is_exactly_zero() {
        let model = ValveFlowModel::default();
        assert_eq!(model.mass_flow_rate(800_000.0, 100_000.0, T, AREA, 0.8, false), 0.0);

        let bidirectional = model.with_direction(FlowDirection::Bidirectional);
        assert_eq!(
            bidirectional.mass_flow_rate(100_000.0, 800_000.0, T, AREA, 0.8, false),
            0.0
        );
    }

    #[test]
    fn test_one_way_blocks_back_flow() {
        let model = ValveFlowModel::default();
        assert_eq!(model.mass_flow_rate(100_000.0, 800_000.0, T, AREA, 0.8, true), 0.0);
        assert_eq!(model.mass_flow_rate(300_000.0, 300_000.0, T, AREA, 0.8, true), 0.0);
    }

    #[test]
    fn test_bidirectional_reverses() {
        let model = ValveFlowModel::default().with_direction(FlowDirection::Bidirectional);
        let forward = model.mass_flow_rate(400_000.0, 300_000.0, T, AREA, 0.8, true);
        let reverse = model.mass_flow_rate(300_000.0, 400_000.0, T, AREA, 0.8, true);

        assert!(forward > 0.0);
        assert!(reverse < 0.0);
        assert_relative_eq!(forward, -reverse, max_relative = 1e-12);
    }

    #[test]
    fn test_choked_mass_flux_air() {
        // Choked air: ṁ ≈ 0.0404 · Cd·A·p / sqrt(T)
        let model = ValveFlowModel::default();
        let p_up = 600_000.0;
        let rate = model.mass_flow_rate(p_up, STANDARD_ATMOSPHERE, T, AREA, 1.0, true);
        let expected = 0.040_418 * AREA * p_up / T.sqrt();
        assert_relative_eq!(rate, expected, max_relative = 1e-3);
    }

    #[test]
    fn test_choked_flow_ignores_downstream() {
        let model = ValveFlowModel::default();
        let a = model.mass_flow_rate(1_000_000.0, 100_000.0, T, AREA, 0.8, true);
        let b = model.mass_flow_rate(1_000_000.0, 300_000.0, T, AREA, 0.8, true);
        assert!(model.is_choked(1_000_000.0, 300_000.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_continuous_at_critical_ratio() {
        let model = ValveFlowModel::default();
        let p_up = 500_000.0;
        let p_crit = p_up * model.critical_pressure_ratio();

        let choked = model.mass_flow_rate(p_up, p_crit * (1.0 - 1e-9), T, AREA, 0.8, true);
        let subsonic = model.mass_flow_rate(p_up, p_crit * (1.0 + 1e-9), T, AREA, 0.8, true);
        assert_relative_eq!(choked, subsonic, max_relative = 1e-6);
    }

    #[test]
    fn test_subsonic_flow_grows_with_pressure_drop() {
        let model = ValveFlowModel::default();
        let p_up = 200_000.0;
        let small_drop = model.mass_flow_rate(p_up, 190_000.0, T, AREA, 0.8, true);
        let large_drop = model.mass_flow_rate(p_up, 150_000.0, T, AREA, 0.8, true);
        assert!(small_drop > 0.0);
        assert!(large_drop > small_drop);
    }

    #[test]
    fn test_degenerate_orifice_yields_zero() {
        let model = ValveFlowModel::default();
        assert_eq!(model.mass_flow_rate(500_000.0, 100_000.0, T, 0.0, 0.8, true), 0.0);
        assert_eq!(model.mass_flow_rate(500_000.0, 100_000.0, T, AREA, 0.0, true), 0.0);
        assert_eq!(model.mass_flow_rate(500_000.0, 100_000.0, 0.0, AREA, 0.8, true), 0.0);
        assert_eq!(model.mass_flow_rate(f64::NAN, 100_000.0, T, AREA, 0.8, true), 0.0);
    }

    #[test]
    fn test_flow_between_uses_sink_temperature_for_reverse_flow() {
        let model = ValveFlowModel::default().with_direction(FlowDirection::Bidirectional);
        let orifice = Orifice::new(AREA, 0.8);
        let cold = FlowConditions::new(200_000.0, 250.0);
        let hot = FlowConditions::new(300_000.0, 400.0);

        let reverse = model.flow_between(cold, hot, &orifice, true);
        let forward = model.flow_between(hot, cold, &orifice, true);
        assert!(reverse < 0.0);
        assert_relative_eq!(reverse, -forward, max_relative = 1e-12);
    }

    #[test]
    fn test_orifice_from_diameter() {
        let orifice = Orifice::from_diameter(0.002, 0.7);
        assert_relative_eq!(orifice.area, PI * 1e-6, max_relative = 1e-12);
        assert_relative_eq!(orifice.effective_area(), 0.7 * PI * 1e-6, max_relative = 1e-12);
    }

    #[test]
    fn test_try_new_rejects_invalid_gas() {
        let bad = GasProperties {
            gas_constant: 287.05,
            specific_heat_ratio: 1.0,
        };
        assert!(matches!(
            ValveFlowModel::try_new(bad),
            Err(ThermoError::InvalidProperties { .. })
        ));

        let model = ValveFlowModel::try_new(GasProperties::air()).unwrap();
        assert_eq!(model, ValveFlowModel::new(GasProperties::air()));
        assert!(model.critical_pressure_ratio().is_finite());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_rebuilds_coefficients() {
        let model =
            ValveFlowModel::new(GasProperties::air()).with_direction(FlowDirection::Bidirectional);
        let json = serde_json::to_string(&model).unwrap();
        assert!(!json.contains("critical_ratio"));
        let loaded: ValveFlowModel = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, model);

        let bad = r#"{"properties":{"gas_constant":287.05,"specific_heat_ratio":0.9},"direction":"OneWay"}"#;
        assert!(serde_json::from_str::<ValveFlowModel>(bad).is_err());
    }
}
