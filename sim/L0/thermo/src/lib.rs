//! Gas thermodynamics for pneumatic simulation.
//!
//! This crate provides the gas-side physics of a pneumatic spring:
//!
//! - [`GasState`] - Mass, temperature, volume and derived pressure of one
//!   enclosed gas volume
//! - [`GasProperties`] - Gas constant and specific heat ratio of a species
//! - [`VolumeProcess`] - Isothermal or adiabatic response to volume changes
//! - [`ValveFlowModel`] - Choked/subsonic compressible flow through an orifice
//!
//! # Ideal-Gas Invariant
//!
//! Every [`GasState`] satisfies `p = m * R * T / V` immediately after any
//! mutation. Operations that would break the state (non-positive volume,
//! negative injection) fail with [`ThermoError`] and leave it untouched.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no logging:
//! functions return typed results and the caller decides what to report.
//!
//! # Example
//!
//! ```
//! use sim_thermo::{GasProperties, GasState, Orifice, ValveFlowModel, VolumeProcess};
//!
//! let air = GasProperties::air();
//! let mut chamber = GasState::from_pressure(400_000.0, 293.15, 0.001, air)?;
//!
//! // Compress quickly: adiabatic heating raises the pressure more than p·V = const
//! chamber.update_volume(0.0008, VolumeProcess::Adiabatic)?;
//! assert!(chamber.pressure() > 500_000.0);
//!
//! // Vent to atmosphere for one millisecond
//! let model = ValveFlowModel::new(air);
//! let orifice = Orifice::from_diameter(0.002, 0.7);
//! let rate = model.mass_flow_rate(
//!     chamber.pressure(),
//!     sim_thermo::STANDARD_ATMOSPHERE,
//!     chamber.temperature(),
//!     orifice.area,
//!     orifice.discharge_coefficient,
//!     true,
//! );
//! chamber.remove_mass(rate * 0.001)?;
//! # Ok::<(), sim_thermo::ThermoError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-thermo/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod error;
mod gas;
mod valve;

pub use error::ThermoError;
pub use gas::{
    GasProperties, GasState, VolumeProcess, MIN_GAS_MASS, STANDARD_ATMOSPHERE,
    STANDARD_TEMPERATURE,
};
pub use valve::{FlowConditions, FlowDirection, Orifice, ValveFlowModel};

/// Result type for gas state operations.
pub type Result<T> = std::result::Result<T, ThermoError>;
