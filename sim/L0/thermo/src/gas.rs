//! Thermodynamic state of an enclosed ideal-gas volume.
//!
//! A [`GasState`] tracks mass, temperature and volume of the gas in one
//! chamber and derives pressure from the ideal-gas law:
//!
//! ```text
//! p = m * R * T / V
//! ```
//!
//! Pressure is never stored independently of the other three quantities: every
//! mutation recomputes it before returning, so a reader always observes a
//! consistent state.
//!
//! # Volume changes
//!
//! Volume changes follow one of two process assumptions ([`VolumeProcess`]):
//!
//! ```text
//! isothermal:  T2 = T1
//! adiabatic:   T2 = T1 * (V1 / V2)^(γ - 1)
//! ```
//!
//! # Mass exchange
//!
//! Incoming mass mixes with the resident gas by mass-weighted temperature
//! averaging. Withdrawals go through [`GasState::remove_mass`], which leaves
//! the resident temperature unchanged.
//!
//! # Example
//!
//! ```
//! use sim_thermo::{GasProperties, GasState, VolumeProcess};
//!
//! let mut gas = GasState::new(1.0, 300.0, 1.0, GasProperties::air())?;
//! gas.add_mass(1.0, 500.0)?;
//! assert!((gas.temperature() - 400.0).abs() < 1e-9);
//!
//! gas.update_volume(0.5, VolumeProcess::Isothermal)?;
//! assert!((gas.temperature() - 400.0).abs() < 1e-9);
//! # Ok::<(), sim_thermo::ThermoError>(())
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ThermoError;
use crate::valve::FlowConditions;
use crate::Result;

/// Standard atmospheric pressure (Pa).
pub const STANDARD_ATMOSPHERE: f64 = 101_325.0;

/// Standard ambient temperature (K), 20 °C.
pub const STANDARD_TEMPERATURE: f64 = 293.15;

/// Smallest mass a chamber may hold (kg).
///
/// Withdrawals stop at this floor so the state never reaches zero mass.
pub const MIN_GAS_MASS: f64 = 1e-12;

// ============================================================================
// Gas Properties
// ============================================================================

/// Fixed constants of a gas species.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GasProperties {
    /// Specific gas constant R (J/(kg·K)).
    pub gas_constant: f64,
    /// Ratio of specific heats γ = cp / cv.
    pub specific_heat_ratio: f64,
}

impl GasProperties {
    /// Create gas properties, validating the constants.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoError::InvalidProperties`] if `gas_constant` is not
    /// positive or `specific_heat_ratio` is not greater than 1.
    pub fn new(gas_constant: f64, specific_heat_ratio: f64) -> Result<Self> {
        let props = Self {
            gas_constant,
            specific_heat_ratio,
        };
        props.validate()?;
        Ok(props)
    }

    /// Dry air.
    #[must_use]
    pub const fn air() -> Self {
        Self {
            gas_constant: 287.05,
            specific_heat_ratio: 1.4,
        }
    }

    /// Nitrogen, common as a sealed spring charge.
    #[must_use]
    pub const fn nitrogen() -> Self {
        Self {
            gas_constant: 296.8,
            specific_heat_ratio: 1.4,
        }
    }

    /// Helium (monatomic).
    #[must_use]
    pub const fn helium() -> Self {
        Self {
            gas_constant: 2077.1,
            specific_heat_ratio: 5.0 / 3.0,
        }
    }

    /// Specific heat at constant volume (J/(kg·K)).
    #[must_use]
    pub fn cv(&self) -> f64 {
        self.gas_constant / (self.specific_heat_ratio - 1.0)
    }

    /// Specific heat at constant pressure (J/(kg·K)).
    #[must_use]
    pub fn cp(&self) -> f64 {
        self.specific_heat_ratio * self.cv()
    }

    /// Validate the constants.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoError::InvalidProperties`] for non-physical constants.
    pub fn validate(&self) -> Result<()> {
        if !self.gas_constant.is_finite() || self.gas_constant <= 0.0 {
            return Err(ThermoError::invalid_properties(
                "gas constant must be positive and finite",
            ));
        }
        if !self.specific_heat_ratio.is_finite() || self.specific_heat_ratio <= 1.0 {
            return Err(ThermoError::invalid_properties(
                "specific heat ratio must be greater than 1",
            ));
        }
        Ok(())
    }
}

impl Default for GasProperties {
    fn default() -> Self {
        Self::air()
    }
}

// ============================================================================
// Volume Process
// ============================================================================

/// Process assumption used when a chamber's volume changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VolumeProcess {
    /// Temperature held constant (slow motion, full heat exchange).
    Isothermal,
    /// No heat exchange with the walls (fast motion).
    #[default]
    Adiabatic,
}

impl std::fmt::Display for VolumeProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Isothermal => write!(f, "isothermal"),
            Self::Adiabatic => write!(f, "adiabatic"),
        }
    }
}

// ============================================================================
// Gas State
// ============================================================================

/// Thermodynamic state of one enclosed gas volume.
///
/// Serialized without its pressure; deserializing goes through
/// [`GasState::new`], so a loaded state is validated and consistent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "GasStateRecord", into = "GasStateRecord")
)]
pub struct GasState {
    mass: f64,
    temperature: f64,
    volume: f64,
    pressure: f64,
    properties: GasProperties,
}

/// Stored form of a [`GasState`].
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct GasStateRecord {
    mass: f64,
    temperature: f64,
    volume: f64,
    properties: GasProperties,
}

#[cfg(feature = "serde")]
impl From<GasState> for GasStateRecord {
    fn from(state: GasState) -> Self {
        Self {
            mass: state.mass,
            temperature: state.temperature,
            volume: state.volume,
            properties: state.properties,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<GasStateRecord> for GasState {
    type Error = ThermoError;

    fn try_from(record: GasStateRecord) -> Result<Self> {
        Self::new(
            record.mass,
            record.temperature,
            record.volume,
            record.properties,
        )
    }
}

impl GasState {
    /// Create a gas state from mass, temperature and volume.
    ///
    /// # Errors
    ///
    /// Returns an error if any quantity is non-positive or non-finite, or if
    /// the gas properties are invalid.
    pub fn new(
        mass: f64,
        temperature: f64,
        volume: f64,
        properties: GasProperties,
    ) -> Result<Self> {
        properties.validate()?;
        if !mass.is_finite() || mass <= 0.0 {
            return Err(ThermoError::invalid_mass(mass, "charge must be positive"));
        }
        check_temperature(temperature)?;
        check_volume(volume)?;

        let mut state = Self {
            mass,
            temperature,
            volume,
            pressure: 0.0,
            properties,
        };
        state.refresh_pressure();
        Ok(state)
    }

    /// Create a gas state holding the given pressure.
    ///
    /// The mass is derived as `m = p * V / (R * T)`.
    ///
    /// # Errors
    ///
    /// Returns an error if pressure, temperature or volume are non-positive or
    /// non-finite.
    pub fn from_pressure(
        pressure: f64,
        temperature: f64,
        volume: f64,
        properties: GasProperties,
    ) -> Result<Self> {
        properties.validate()?;
        check_temperature(temperature)?;
        check_volume(volume)?;
        if !pressure.is_finite() || pressure <= 0.0 {
            return Err(ThermoError::invalid_mass(
                pressure * volume,
                "pressure must be positive",
            ));
        }
        let mass = pressure * volume / (properties.gas_constant * temperature);
        Self::new(mass, temperature, volume, properties)
    }

    /// Create a gas state at standard atmospheric conditions.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume is invalid.
    pub fn atmospheric(volume: f64, properties: GasProperties) -> Result<Self> {
        Self::from_pressure(STANDARD_ATMOSPHERE, STANDARD_TEMPERATURE, volume, properties)
    }

    /// Gas mass (kg).
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Gas temperature (K).
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Enclosed volume (m³).
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Absolute pressure (Pa), always equal to `m * R * T / V`.
    #[must_use]
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Gas species constants.
    #[must_use]
    pub fn properties(&self) -> &GasProperties {
        &self.properties
    }

    /// Density (kg/m³).
    #[must_use]
    pub fn density(&self) -> f64 {
        self.mass / self.volume
    }

    /// Local speed of sound (m/s).
    #[must_use]
    pub fn speed_of_sound(&self) -> f64 {
        (self.properties.specific_heat_ratio * self.properties.gas_constant * self.temperature)
            .sqrt()
    }

    /// Pressure and temperature as seen by an orifice.
    #[must_use]
    pub fn conditions(&self) -> FlowConditions {
        FlowConditions::new(self.pressure, self.temperature)
    }

    /// Change the enclosed volume.
    ///
    /// Under [`VolumeProcess::Isothermal`] the temperature is kept; under
    /// [`VolumeProcess::Adiabatic`] it follows `T2 = T1 * (V1 / V2)^(γ - 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoError::InvalidVolume`] if `new_volume <= 0` or is not
    /// finite. The state is unchanged on error.
    pub fn update_volume(&mut self, new_volume: f64, process: VolumeProcess) -> Result<()> {
        check_volume(new_volume)?;

        if process == VolumeProcess::Adiabatic {
            let exponent = self.properties.specific_heat_ratio - 1.0;
            self.temperature *= (self.volume / new_volume).powf(exponent);
        }
        self.volume = new_volume;
        self.refresh_pressure();
        Ok(())
    }

    /// Inject mass at the given temperature.
    ///
    /// The mixture temperature is the mass-weighted average:
    ///
    /// ```text
    /// T_mix = (m1 * T1 + m2 * T2) / (m1 + m2)
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ThermoError::InvalidMass`] if `mass_in` is negative or not
    /// finite (withdrawals go through [`GasState::remove_mass`]) and
    /// [`ThermoError::InvalidTemperature`] for a non-positive temperature.
    pub fn add_mass(&mut self, mass_in: f64, temperature_in: f64) -> Result<()> {
        if !mass_in.is_finite() || mass_in < 0.0 {
            return Err(ThermoError::invalid_mass(
                mass_in,
                "injection must be non-negative; use remove_mass for withdrawal",
            ));
        }
        if mass_in == 0.0 {
            return Ok(());
        }
        check_temperature(temperature_in)?;

        let total = self.mass + mass_in;
        self.temperature = self
            .mass
            .mul_add(self.temperature, mass_in * temperature_in)
            / total;
        self.mass = total;
        self.refresh_pressure();
        Ok(())
    }

    /// Withdraw mass from the chamber.
    ///
    /// The resident gas keeps its temperature. The withdrawal is limited so
    /// that at least [`MIN_GAS_MASS`] remains.
    ///
    /// Returns the mass actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoError::InvalidMass`] if `mass_out` is negative or not
    /// finite.
    pub fn remove_mass(&mut self, mass_out: f64) -> Result<f64> {
        if !mass_out.is_finite() || mass_out < 0.0 {
            return Err(ThermoError::invalid_mass(
                mass_out,
                "withdrawal must be non-negative",
            ));
        }
        let available = (self.mass - MIN_GAS_MASS).max(0.0);
        let removed = mass_out.min(available);
        self.mass -= removed;
        self.refresh_pressure();
        Ok(removed)
    }

    /// Overwrite the temperature (e.g. after wall heat exchange).
    ///
    /// # Errors
    ///
    /// Returns [`ThermoError::InvalidTemperature`] for non-positive input.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        check_temperature(temperature)?;
        self.temperature = temperature;
        self.refresh_pressure();
        Ok(())
    }

    fn refresh_pressure(&mut self) {
        self.pressure =
            self.mass * self.properties.gas_constant * self.temperature / self.volume;
    }
}

fn check_volume(volume: f64) -> Result<()> {
    if volume.is_finite() && volume > 0.0 {
        Ok(())
    } else {
        Err(ThermoError::invalid_volume(volume))
    }
}

fn check_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(ThermoError::invalid_temperature(temperature))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ideal_gas_pressure(gas: &GasState) -> f64 {
        gas.mass() * gas.properties().gas_constant * gas.temperature() / gas.volume()
    }

    #[test]
    fn test_new_state_satisfies_ideal_gas_law() {
        let gas = GasState::new(0.01, 300.0, 0.002, GasProperties::air()).unwrap();
        assert_relative_eq!(gas.pressure(), ideal_gas_pressure(&gas), max_relative = 1e-12);
    }

    #[test]
    fn test_from_pressure_round_trips() {
        let gas = GasState::from_pressure(500_000.0, 293.15, 0.001, GasProperties::air()).unwrap();
        assert_relative_eq!(gas.pressure(), 500_000.0, max_relative = 1e-12);
        assert!(gas.mass() > 0.0);
    }

    #[test]
    fn test_atmospheric_state() {
        let gas = GasState::atmospheric(0.001, GasProperties::air()).unwrap();
        assert_relative_eq!(gas.pressure(), STANDARD_ATMOSPHERE, max_relative = 1e-12);
        // Air at 20 °C is about 1.2 kg/m³
        assert!(gas.density() > 1.1 && gas.density() < 1.3);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(GasState::new(0.0, 300.0, 1.0, GasProperties::air()).is_err());
        assert!(GasState::new(1.0, -1.0, 1.0, GasProperties::air()).is_err());
        assert!(GasState::new(1.0, 300.0, 0.0, GasProperties::air()).is_err());
        assert!(GasState::new(1.0, 300.0, f64::NAN, GasProperties::air()).is_err());
        assert!(GasProperties::new(287.0, 1.0).is_err());
        assert!(GasProperties::new(-1.0, 1.4).is_err());
    }

    #[test]
    fn test_add_mass_mixes_temperature() {
        let mut gas = GasState::new(1.0, 300.0, 1.0, GasProperties::air()).unwrap();
        gas.add_mass(1.0, 500.0).unwrap();

        assert_relative_eq!(gas.temperature(), 400.0, epsilon = 1e-10);
        assert_relative_eq!(gas.mass(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(gas.pressure(), ideal_gas_pressure(&gas), max_relative = 1e-12);
    }

    #[test]
    fn test_add_mass_total_is_associative() {
        let mut split = GasState::new(0.5, 290.0, 0.01, GasProperties::air()).unwrap();
        split.add_mass(0.2, 350.0).unwrap();
        split.add_mass(0.3, 350.0).unwrap();

        let mut combined = GasState::new(0.5, 290.0, 0.01, GasProperties::air()).unwrap();
        combined.add_mass(0.5, 350.0).unwrap();

        assert_relative_eq!(split.mass(), combined.mass(), epsilon = 1e-12);
        assert_relative_eq!(split.temperature(), combined.temperature(), epsilon = 1e-9);
    }

    #[test]
    fn test_add_mass_rejects_negative() {
        let mut gas = GasState::new(1.0, 300.0, 1.0, GasProperties::air()).unwrap();
        let before = gas.clone();

        let err = gas.add_mass(-0.1, 300.0).unwrap_err();
        assert!(err.is_mass_error());
        assert_eq!(gas, before);

        assert!(gas.add_mass(0.1, 0.0).is_err());
        assert_eq!(gas, before);
    }

    #[test]
    fn test_add_zero_mass_is_noop() {
        let mut gas = GasState::new(1.0, 300.0, 1.0, GasProperties::air()).unwrap();
        let before = gas.clone();
        gas.add_mass(0.0, 1000.0).unwrap();
        assert_eq!(gas, before);
    }

    #[test]
    fn test_isothermal_keeps_temperature() {
        let mut gas = GasState::new(0.01, 300.0, 0.002, GasProperties::air()).unwrap();
        let p1 = gas.pressure();

        gas.update_volume(0.001, VolumeProcess::Isothermal).unwrap();

        assert_eq!(gas.temperature(), 300.0);
        assert_relative_eq!(gas.pressure(), 2.0 * p1, max_relative = 1e-12);
    }

    #[test]
    fn test_adiabatic_temperature_ratio() {
        let mut gas = GasState::new(0.01, 300.0, 0.002, GasProperties::air()).unwrap();
        let (t1, v1) = (gas.temperature(), gas.volume());
        let v2 = 0.0013;

        gas.update_volume(v2, VolumeProcess::Adiabatic).unwrap();

        let expected = (v1 / v2).powf(0.4);
        assert_relative_eq!(gas.temperature() / t1, expected, max_relative = 1e-12);
        assert_relative_eq!(gas.pressure(), ideal_gas_pressure(&gas), max_relative = 1e-12);
    }

    #[test]
    fn test_adiabatic_pressure_follows_polytrope() {
        // p * V^γ is constant for an adiabatic process
        let mut gas = GasState::new(0.01, 300.0, 0.002, GasProperties::air()).unwrap();
        let invariant = gas.pressure() * gas.volume().powf(1.4);

        gas.update_volume(0.0015, VolumeProcess::Adiabatic).unwrap();

        assert_relative_eq!(
            gas.pressure() * gas.volume().powf(1.4),
            invariant,
            max_relative = 1e-10
        );
    }

    #[test]
    fn test_update_volume_rejects_non_positive() {
        let mut gas = GasState::new(0.01, 300.0, 0.002, GasProperties::air()).unwrap();
        let before = gas.clone();

        assert!(gas
            .update_volume(0.0, VolumeProcess::Isothermal)
            .unwrap_err()
            .is_volume_error());
        assert!(gas.update_volume(-1.0, VolumeProcess::Adiabatic).is_err());
        assert!(gas.update_volume(f64::INFINITY, VolumeProcess::Adiabatic).is_err());
        assert_eq!(gas, before);
    }

    #[test]
    fn test_remove_mass_keeps_temperature() {
        let mut gas = GasState::new(1.0, 320.0, 1.0, GasProperties::air()).unwrap();
        let removed = gas.remove_mass(0.25).unwrap();

        assert_relative_eq!(removed, 0.25, epsilon = 1e-12);
        assert_relative_eq!(gas.mass(), 0.75, epsilon = 1e-12);
        assert_eq!(gas.temperature(), 320.0);
        assert_relative_eq!(gas.pressure(), ideal_gas_pressure(&gas), max_relative = 1e-12);
    }

    #[test]
    fn test_remove_mass_stops_at_floor() {
        let mut gas = GasState::new(1e-3, 300.0, 1.0, GasProperties::air()).unwrap();
        let removed = gas.remove_mass(1.0).unwrap();

        assert!(removed < 1e-3);
        assert_relative_eq!(gas.mass(), MIN_GAS_MASS, max_relative = 1e-6);
        assert!(gas.pressure() > 0.0);
        assert!(gas.remove_mass(-1.0).is_err());
    }

    #[test]
    fn test_speed_of_sound_air() {
        let gas = GasState::new(1.0, 293.15, 1.0, GasProperties::air()).unwrap();
        // ~343 m/s at 20 °C
        assert_relative_eq!(gas.speed_of_sound(), 343.2, epsilon = 0.5);
    }

    #[test]
    fn test_specific_heats() {
        let air = GasProperties::air();
        assert_relative_eq!(air.cp() - air.cv(), air.gas_constant, epsilon = 1e-9);
        assert_relative_eq!(air.cp() / air.cv(), 1.4, epsilon = 1e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_recomputes_pressure() {
        let gas = GasState::new(0.01, 300.0, 0.002, GasProperties::air()).unwrap();
        let json = serde_json::to_string(&gas).unwrap();
        assert!(!json.contains("pressure"));
        let loaded: GasState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, gas);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_rejects_invalid_state() {
        let air = r#"{"gas_constant":287.05,"specific_heat_ratio":1.4}"#;
        let zero_volume =
            format!(r#"{{"mass":0.01,"temperature":300.0,"volume":0.0,"properties":{air}}}"#);
        assert!(serde_json::from_str::<GasState>(&zero_volume).is_err());

        let zero_mass =
            format!(r#"{{"mass":0.0,"temperature":300.0,"volume":0.002,"properties":{air}}}"#);
        assert!(serde_json::from_str::<GasState>(&zero_mass).is_err());

        let bad_gamma = r#"{"mass":0.01,"temperature":300.0,"volume":0.002,"properties":{"gas_constant":287.05,"specific_heat_ratio":1.0}}"#;
        assert!(serde_json::from_str::<GasState>(bad_gamma).is_err());
    }
}
