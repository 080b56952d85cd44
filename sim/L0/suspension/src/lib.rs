//! Suspension kinematics and geometry validation.
//!
//! This crate couples lever angle to cylinder stroke:
//!
//! - [`LeverKinematics`] - Lever angle to rod attachment point, and the angle
//!   limit imposed by the adjacent corner
//! - [`CylinderKinematics`] - Attachment distance to stroke, stroke bounds,
//!   chamber lengths and volumes
//! - [`KinematicsProvider`] - The capability the pneumatic cylinder consumes,
//!   implemented by [`LeverCylinderKinematics`]
//! - [`GeometryState`] - Validated, normalized corner dimensions
//!
//! # Coordinates
//!
//! Each corner lives in a vertical plane with `+x` pointing toward the
//! adjacent corner and `+y` up. Angles are measured from `+x`; full droop is
//! `-π/2`.
//!
//! # Example
//!
//! ```
//! use sim_suspension::{GeometryParameter, GeometryState, KinematicsProvider};
//!
//! let mut geometry = GeometryState::default();
//! let corrections = geometry.set_parameter(GeometryParameter::Stroke, 0.5);
//! assert_eq!(corrections.len(), 1);
//! assert!(geometry.report().valid);
//!
//! let kinematics = geometry.kinematics()?;
//! let stroke = kinematics.stroke_at_angle(-0.3)?;
//! assert!(kinematics.stroke_bounds().contains(stroke));
//! # Ok::<(), sim_suspension::KinematicsError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-suspension/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

mod cylinder;
mod error;
mod geometry;
mod lever;
mod provider;

pub use cylinder::{
    ChamberAreas, ChamberPair, CylinderKinematics, DeadZone, StrokeBounds, AREA_EPSILON,
};
pub use error::KinematicsError;
pub use geometry::{
    ConstraintKind, ConstraintViolation, Correction, GeometryParameter, GeometryState,
    GeometryUpdate, ValidationReport, MAX_ROD_BORE_RATIO, MIN_LEVER_TRAVEL, MIN_ROD_BORE_RATIO,
};
pub use lever::{LeverGeometry, LeverKinematics, LeverState, FULL_DROOP_ANGLE};
pub use provider::{KinematicsProvider, LeverCylinderKinematics};

/// Result type for kinematics operations.
pub type Result<T> = std::result::Result<T, KinematicsError>;
