//! Pneumatic cylinder model for suspension simulation.
//!
//! A [`PneumaticCylinder`] owns a head-side and a rod-side [`GasState`],
//! exchanges mass with the atmosphere, a supply reservoir or its other chamber
//! through named [`ValvePort`]s, follows a stroke commanded either directly or
//! by lever angle through a [`KinematicsProvider`], and reports the net rod
//! force.
//!
//! - [`CylinderSpec`] - Dimensions, working gas and initial charge
//! - [`ValvePort`] / [`ValveStates`] - Port wiring and per-step open state
//! - [`FrictionModel`] - Coulomb + viscous seal friction with stiction
//! - [`AmbientConditions`] - What exhaust ports vent to
//!
//! # Per-step conditions
//!
//! An out-of-range stroke command is clamped, logged with `tracing` and
//! returned as a [`ConstraintViolation`] in the [`StepOutput`]; the step
//! still completes. Construction errors (an unbuildable cylinder) are returned
//! as [`PneumaticError`].
//!
//! [`GasState`]: sim_thermo::GasState
//! [`KinematicsProvider`]: sim_suspension::KinematicsProvider
//! [`ConstraintViolation`]: sim_suspension::ConstraintViolation

#![doc(html_root_url = "https://docs.rs/sim-pneumatic/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod cylinder;
mod error;
mod friction;
mod port;
mod spec;

pub use cylinder::{
    CylinderSnapshot, CylinderState, Drive, PneumaticCylinder, StepOutput, VOLUME_EPSILON,
};
pub use error::PneumaticError;
pub use friction::FrictionModel;
pub use port::{Chamber, PortDirection, PortTarget, ValvePort, ValveStates};
pub use spec::{AmbientConditions, CylinderSpec};

/// Result type for pneumatic cylinder operations.
pub type Result<T> = std::result::Result<T, PneumaticError>;
