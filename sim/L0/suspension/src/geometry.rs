//! Suspension geometry: the single source of truth for kinematic limits.
//!
//! [`GeometryState`] holds every dimension of one suspension corner. It is an
//! explicit value owned by the caller; there is no shared settings object.
//! Each mutation goes through [`GeometryState::normalize_parameter`], which
//! clamps the request against physical limits and the limits implied by the
//! other parameters, and is followed by a full
//! [`GeometryState::validate_all_constraints`] pass.
//!
//! # Constraint families
//!
//! | Kind          | Check                                                    |
//! |---------------|----------------------------------------------------------|
//! | Geometric     | Lever keeps [`MIN_LEVER_TRAVEL`] clear of the next corner |
//! | Cylindrical   | Requested stroke fits inside the cylinder body            |
//! | Hydraulic     | Rod/bore ratio in `[0.2, 0.8]`                            |
//! | Kinematic     | Requested stroke is reachable by the lever                |
//!
//! When the cylinder length limit and the lever reach disagree, the tighter of
//! the two is authoritative ([`GeometryState::stroke_max`]).

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::Point2;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cylinder::{CylinderKinematics, DeadZone, StrokeBounds};
use crate::error::KinematicsError;
use crate::lever::{LeverGeometry, LeverKinematics, FULL_DROOP_ANGLE};
use crate::provider::LeverCylinderKinematics;
use crate::Result;

/// Minimum collision-free lever travel above full droop (15°).
pub const MIN_LEVER_TRAVEL: f64 = PI / 12.0;

/// Smallest sane rod-to-bore diameter ratio.
pub const MIN_ROD_BORE_RATIO: f64 = 0.2;

/// Largest sane rod-to-bore diameter ratio.
pub const MAX_ROD_BORE_RATIO: f64 = 0.8;

/// Slack allowed when checking values that normalization put on a bound.
const CHECK_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Parameters
// ============================================================================

/// A named geometry parameter. All values are SI (metres, or a fraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GeometryParameter {
    /// Distance between adjacent lever pivots.
    Wheelbase,
    /// Lever arm length.
    LeverLength,
    /// Horizontal offset from the lever pivot to the cylinder hinge.
    FrameToPivot,
    /// Rod attachment position along the lever (0..1).
    RodPositionFraction,
    /// Cylinder bore diameter.
    BoreDiameter,
    /// Piston rod diameter.
    RodDiameter,
    /// Inner cylinder body length.
    BodyLength,
    /// Piston thickness.
    PistonThickness,
    /// Dead-zone length at the rod end.
    DeadZoneRod,
    /// Dead-zone length at the head end.
    DeadZoneHead,
    /// Requested maximum stroke.
    Stroke,
}

impl GeometryParameter {
    /// Every parameter, in update order.
    pub const ALL: [Self; 11] = [
        Self::Wheelbase,
        Self::LeverLength,
        Self::FrameToPivot,
        Self::RodPositionFraction,
        Self::BoreDiameter,
        Self::RodDiameter,
        Self::BodyLength,
        Self::PistonThickness,
        Self::DeadZoneRod,
        Self::DeadZoneHead,
        Self::Stroke,
    ];

    /// The snake_case field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wheelbase => "wheelbase",
            Self::LeverLength => "lever_length",
            Self::FrameToPivot => "frame_to_pivot",
            Self::RodPositionFraction => "rod_position_fraction",
            Self::BoreDiameter => "bore_diameter",
            Self::RodDiameter => "rod_diameter",
            Self::BodyLength => "body_length",
            Self::PistonThickness => "piston_thickness",
            Self::DeadZoneRod => "dead_zone_rod",
            Self::DeadZoneHead => "dead_zone_head",
            Self::Stroke => "stroke",
        }
    }

    /// Physical limits `(min, max)` independent of other parameters.
    #[must_use]
    pub const fn physical_range(&self) -> (f64, f64) {
        match self {
            Self::Wheelbase => (0.5, 20.0),
            Self::LeverLength => (0.05, 5.0),
            Self::FrameToPivot => (0.01, 2.0),
            Self::RodPositionFraction => (0.05, 1.0),
            Self::BoreDiameter => (0.01, 0.5),
            Self::RodDiameter => (0.005, 0.4),
            Self::BodyLength => (0.05, 3.0),
            Self::PistonThickness => (0.002, 0.2),
            Self::DeadZoneRod | Self::DeadZoneHead => (0.0, 0.5),
            Self::Stroke => (0.0, 3.0),
        }
    }
}

impl fmt::Display for GeometryParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryParameter {
    type Err = KinematicsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| KinematicsError::UnknownParameter(s.to_string()))
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Which family of limits was involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintKind {
    /// Parameter's own physical range.
    Physical,
    /// Lever reach against the wheelbase.
    Geometric,
    /// Stroke against the cylinder body.
    Cylindrical,
    /// Rod-to-bore ratio.
    Hydraulic,
    /// Stroke against lever reach.
    Kinematic,
    /// NaN or infinite request.
    NonFinite,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Physical => "physical",
            Self::Geometric => "geometric",
            Self::Cylindrical => "cylindrical",
            Self::Hydraulic => "hydraulic",
            Self::Kinematic => "kinematic",
            Self::NonFinite => "non-finite",
        })
    }
}

/// A requested value that was adjusted before being applied.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correction {
    /// The parameter that was adjusted.
    pub parameter: GeometryParameter,
    /// The value that was asked for.
    pub requested: f64,
    /// The value that was applied.
    pub applied: f64,
    /// The limit that forced the adjustment.
    pub constraint: ConstraintKind,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} ({} limit)",
            self.parameter, self.requested, self.applied, self.constraint
        )
    }
}

/// A failed constraint check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintViolation {
    /// Which check failed.
    pub kind: ConstraintKind,
    /// Human-readable description.
    pub message: String,
}

impl ConstraintViolation {
    /// Create a violation.
    #[must_use]
    pub fn new(kind: ConstraintKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of [`GeometryState::validate_all_constraints`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationReport {
    /// All checks passed.
    pub valid: bool,
    /// One entry per failed check.
    pub violations: Vec<ConstraintViolation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<ConstraintViolation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    /// Whether a check of the given kind failed.
    #[must_use]
    pub fn has(&self, kind: ConstraintKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

/// A batch of named parameter changes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryUpdate {
    values: BTreeMap<GeometryParameter, f64>,
}

impl GeometryUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one value.
    #[must_use]
    pub fn with(mut self, parameter: GeometryParameter, value: f64) -> Self {
        self.values.insert(parameter, value);
        self
    }

    /// Build an update from field names.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::UnknownParameter`] for an unrecognised name.
    pub fn from_named<'a, I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut update = Self::new();
        for (name, value) in values {
            update.values.insert(name.parse()?, value);
        }
        Ok(update)
    }

    /// Values in application order.
    pub fn iter(&self) -> impl Iterator<Item = (GeometryParameter, f64)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    /// Whether the update is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// GeometryState
// ============================================================================

/// Dimensions of one suspension corner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryState {
    wheelbase: f64,
    lever_length: f64,
    frame_to_pivot: f64,
    rod_position_fraction: f64,
    bore_diameter: f64,
    rod_diameter: f64,
    body_length: f64,
    piston_thickness: f64,
    dead_zone_rod: f64,
    dead_zone_head: f64,
    stroke: f64,
    report: ValidationReport,
}

impl Default for GeometryState {
    fn default() -> Self {
        let mut state = Self {
            wheelbase: 2.5,
            lever_length: 0.5,
            frame_to_pivot: 0.1,
            rod_position_fraction: 0.3,
            bore_diameter: 0.08,
            rod_diameter: 0.035,
            body_length: 0.30,
            piston_thickness: 0.02,
            dead_zone_rod: 0.002,
            dead_zone_head: 0.002,
            stroke: 0.24,
            report: ValidationReport::default(),
        };
        state.report = state.validate_all_constraints();
        state
    }
}

impl GeometryState {
    /// Build a state from the defaults plus an update.
    ///
    /// Returns the state and the corrections applied to the update.
    #[must_use]
    pub fn from_update(update: &GeometryUpdate) -> (Self, Vec<Correction>) {
        let mut state = Self::default();
        let corrections = state.apply_update(update);
        (state, corrections)
    }

    /// Current value of a parameter.
    #[must_use]
    pub const fn get(&self, parameter: GeometryParameter) -> f64 {
        match parameter {
            GeometryParameter::Wheelbase => self.wheelbase,
            GeometryParameter::LeverLength => self.lever_length,
            GeometryParameter::FrameToPivot => self.frame_to_pivot,
            GeometryParameter::RodPositionFraction => self.rod_position_fraction,
            GeometryParameter::BoreDiameter => self.bore_diameter,
            GeometryParameter::RodDiameter => self.rod_diameter,
            GeometryParameter::BodyLength => self.body_length,
            GeometryParameter::PistonThickness => self.piston_thickness,
            GeometryParameter::DeadZoneRod => self.dead_zone_rod,
            GeometryParameter::DeadZoneHead => self.dead_zone_head,
            GeometryParameter::Stroke => self.stroke,
        }
    }

    fn slot(&mut self, parameter: GeometryParameter) -> &mut f64 {
        match parameter {
            GeometryParameter::Wheelbase => &mut self.wheelbase,
            GeometryParameter::LeverLength => &mut self.lever_length,
            GeometryParameter::FrameToPivot => &mut self.frame_to_pivot,
            GeometryParameter::RodPositionFraction => &mut self.rod_position_fraction,
            GeometryParameter::BoreDiameter => &mut self.bore_diameter,
            GeometryParameter::RodDiameter => &mut self.rod_diameter,
            GeometryParameter::BodyLength => &mut self.body_length,
            GeometryParameter::PistonThickness => &mut self.piston_thickness,
            GeometryParameter::DeadZoneRod => &mut self.dead_zone_rod,
            GeometryParameter::DeadZoneHead => &mut self.dead_zone_head,
            GeometryParameter::Stroke => &mut self.stroke,
        }
    }

    /// Result of the last validation pass.
    #[must_use]
    pub const fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Requested maximum stroke (m).
    #[must_use]
    pub const fn stroke(&self) -> f64 {
        self.stroke
    }

    /// Distance between adjacent lever pivots (m).
    #[must_use]
    pub const fn wheelbase(&self) -> f64 {
        self.wheelbase
    }

    // ------------------------------------------------------------------------
    // Derived solvers
    // ------------------------------------------------------------------------

    /// Lever geometry with the pivot at the corner origin.
    #[must_use]
    pub fn lever_geometry(&self) -> LeverGeometry {
        LeverGeometry::new(self.lever_length, self.rod_position_fraction)
    }

    /// Cylinder hinge position, `frame_to_pivot` outboard of the pivot.
    #[must_use]
    pub fn frame_hinge(&self) -> Point2<f64> {
        self.lever_geometry().base_position + nalgebra::Vector2::new(-self.frame_to_pivot, 0.0)
    }

    /// Cylinder dimensions.
    #[must_use]
    pub fn cylinder(&self) -> CylinderKinematics {
        CylinderKinematics::new(
            self.bore_diameter,
            self.rod_diameter,
            self.body_length,
            self.piston_thickness,
        )
        .with_dead_zones(
            DeadZone::Length(self.dead_zone_rod),
            DeadZone::Length(self.dead_zone_head),
        )
    }

    /// Lever-plus-cylinder solver for this geometry.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DegenerateGeometry`] if the cylinder has no
    /// usable stroke.
    pub fn kinematics(&self) -> Result<LeverCylinderKinematics> {
        LeverCylinderKinematics::new(
            LeverKinematics::new(self.lever_geometry()),
            self.cylinder(),
            self.frame_hinge(),
            self.wheelbase,
        )
    }

    /// Cylinder stroke range `[x_min, x_max]`.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DegenerateGeometry`] for an unbuildable
    /// cylinder.
    pub fn stroke_bounds(&self) -> Result<StrokeBounds> {
        CylinderKinematics::stroke_bounds(
            self.body_length,
            self.piston_thickness,
            self.dead_zone_rod,
            self.dead_zone_head,
        )
    }

    /// Largest lever angle before the next corner is hit.
    #[must_use]
    pub fn max_lever_angle(&self) -> f64 {
        LeverKinematics::max_angle_for_wheelbase(self.wheelbase, &self.lever_geometry())
    }

    /// Stroke reached with the lever at its largest permissible angle.
    #[must_use]
    pub fn calculate_stroke_max_kinematic(&self) -> f64 {
        let lever = LeverKinematics::new(self.lever_geometry());
        let attachment = lever.solve_from_angle(self.max_lever_angle());
        self.cylinder()
            .stroke_from_attachment(&self.frame_hinge(), &attachment)
    }

    /// Cylinder length limit `body - piston - dead_zone_head`.
    fn stroke_max_cylindrical(&self) -> f64 {
        self.body_length - self.piston_thickness - self.dead_zone_head
    }

    /// The authoritative maximum stroke: the tighter of the cylinder length
    /// limit and the lever reach.
    #[must_use]
    pub fn stroke_max(&self) -> f64 {
        self.stroke_max_cylindrical()
            .min(self.calculate_stroke_max_kinematic())
    }

    /// Travel the cylinder may use: `[x_min, clamp(stroke, x_min, stroke_max)]`.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DegenerateGeometry`] for an unbuildable
    /// cylinder.
    pub fn effective_stroke_range(&self) -> Result<StrokeBounds> {
        let bounds = self.stroke_bounds()?;
        let max = self.stroke.min(self.stroke_max()).max(bounds.min);
        Ok(StrokeBounds {
            min: bounds.min,
            max,
        })
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Run the geometric, cylindrical, hydraulic and kinematic checks.
    #[must_use]
    pub fn validate_all_constraints(&self) -> ValidationReport {
        let mut violations = Vec::new();

        let travel = self.max_lever_angle() - FULL_DROOP_ANGLE;
        if travel + CHECK_TOLERANCE < MIN_LEVER_TRAVEL {
            violations.push(ConstraintViolation::new(
                ConstraintKind::Geometric,
                format!(
                    "lever {:.4} m leaves {:.1}° of travel on a {:.4} m wheelbase (need {:.1}°)",
                    self.lever_length,
                    travel.to_degrees(),
                    self.wheelbase,
                    MIN_LEVER_TRAVEL.to_degrees()
                ),
            ));
        }

        match self.stroke_bounds() {
            Ok(bounds)
                if self.stroke + CHECK_TOLERANCE < bounds.min
                    || self.stroke > bounds.max + CHECK_TOLERANCE =>
            {
                violations.push(ConstraintViolation::new(
                    ConstraintKind::Cylindrical,
                    format!(
                        "stroke {:.4} m outside cylinder range [{:.4}, {:.4}] m",
                        self.stroke, bounds.min, bounds.max
                    ),
                ));
            }
            Ok(_) => {}
            Err(err) => {
                violations.push(ConstraintViolation::new(
                    ConstraintKind::Cylindrical,
                    err.to_string(),
                ));
            }
        }

        let ratio = self.rod_diameter / self.bore_diameter;
        if !(MIN_ROD_BORE_RATIO - CHECK_TOLERANCE..=MAX_ROD_BORE_RATIO + CHECK_TOLERANCE)
            .contains(&ratio)
        {
            violations.push(ConstraintViolation::new(
                ConstraintKind::Hydraulic,
                format!(
                    "rod/bore ratio {ratio:.3} outside [{MIN_ROD_BORE_RATIO}, {MAX_ROD_BORE_RATIO}]"
                ),
            ));
        }

        let reach = self.calculate_stroke_max_kinematic();
        if self.stroke > reach + CHECK_TOLERANCE {
            violations.push(ConstraintViolation::new(
                ConstraintKind::Kinematic,
                format!(
                    "stroke {:.4} m exceeds lever reach {:.4} m",
                    self.stroke, reach
                ),
            ));
        }

        ValidationReport::from_violations(violations)
    }

    // ------------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------------

    /// Limits on `parameter` implied by the other parameters.
    ///
    /// Each side is `(value, kind)`; infinite when unconstrained.
    fn cross_bounds(&self, parameter: GeometryParameter) -> ((f64, ConstraintKind), (f64, ConstraintKind)) {
        use ConstraintKind::{Cylindrical, Geometric, Hydraulic, Kinematic, Physical};
        use GeometryParameter as P;

        let free = (f64::NEG_INFINITY, Physical);
        let open = (f64::INFINITY, Physical);
        let travel_sin = MIN_LEVER_TRAVEL.sin();
        let occupied = self.stroke.max(self.dead_zone_rod);

        match parameter {
            P::Wheelbase => ((2.0 * self.lever_length * travel_sin, Geometric), open),
            P::LeverLength => (free, (self.wheelbase / 2.0 / travel_sin, Geometric)),
            P::FrameToPivot | P::RodPositionFraction => (free, open),
            P::BoreDiameter => (
                (self.rod_diameter / MAX_ROD_BORE_RATIO, Hydraulic),
                (self.rod_diameter / MIN_ROD_BORE_RATIO, Hydraulic),
            ),
            P::RodDiameter => (
                (self.bore_diameter * MIN_ROD_BORE_RATIO, Hydraulic),
                (self.bore_diameter * MAX_ROD_BORE_RATIO, Hydraulic),
            ),
            P::BodyLength => (
                (occupied + self.piston_thickness + self.dead_zone_head, Cylindrical),
                open,
            ),
            P::PistonThickness => (
                free,
                (self.body_length - self.dead_zone_head - occupied, Cylindrical),
            ),
            P::DeadZoneRod => (
                free,
                (
                    self.stroke
                        .min(self.body_length - self.piston_thickness - self.dead_zone_head),
                    Cylindrical,
                ),
            ),
            P::DeadZoneHead => (
                free,
                (
                    self.body_length - self.piston_thickness - occupied,
                    Cylindrical,
                ),
            ),
            P::Stroke => {
                let kinematic = self.calculate_stroke_max_kinematic();
                let cylindrical = self.stroke_max_cylindrical();
                let upper = if kinematic < cylindrical {
                    (kinematic, Kinematic)
                } else {
                    (cylindrical, Cylindrical)
                };
                ((self.dead_zone_rod, Cylindrical), upper)
            }
        }
    }

    /// Clamp a requested value to the tightest applicable limits.
    ///
    /// The range is the parameter's physical range intersected with the
    /// limits implied by the other parameters. If that intersection is empty
    /// the upper limit wins. A NaN or infinite request is replaced by the
    /// current value. Normalizing an already-normalized value returns it
    /// unchanged with no corrections.
    #[must_use]
    pub fn normalize_parameter(
        &self,
        parameter: GeometryParameter,
        value: f64,
    ) -> (f64, Vec<Correction>) {
        let (phys_lo, phys_hi) = parameter.physical_range();
        let ((cross_lo, lo_kind), (cross_hi, hi_kind)) = self.cross_bounds(parameter);

        let (lo, lo_kind) = if cross_lo > phys_lo {
            (cross_lo, lo_kind)
        } else {
            (phys_lo, ConstraintKind::Physical)
        };
        let (hi, hi_kind) = if cross_hi < phys_hi {
            (cross_hi, hi_kind)
        } else {
            (phys_hi, ConstraintKind::Physical)
        };

        let (candidate, non_finite) = if value.is_finite() {
            (value, false)
        } else {
            (self.get(parameter), true)
        };

        let (normalized, kind) = if lo > hi {
            (hi.clamp(phys_lo, phys_hi), hi_kind)
        } else if candidate < lo {
            (lo, lo_kind)
        } else if candidate > hi {
            (hi, hi_kind)
        } else {
            (candidate, ConstraintKind::Physical)
        };

        #[allow(clippy::float_cmp)]
        let unchanged = normalized == value;
        let corrections = if unchanged {
            Vec::new()
        } else {
            vec![Correction {
                parameter,
                requested: value,
                applied: normalized,
                constraint: if non_finite {
                    ConstraintKind::NonFinite
                } else {
                    kind
                },
            }]
        };

        (normalized, corrections)
    }

    /// Normalize, assign and revalidate one parameter.
    ///
    /// Returns the corrections that were applied to the request.
    pub fn set_parameter(&mut self, parameter: GeometryParameter, value: f64) -> Vec<Correction> {
        let corrections = self.assign(parameter, value);
        self.revalidate();
        corrections
    }

    /// Apply a batch of changes in [`GeometryParameter::ALL`] order, then
    /// revalidate once.
    pub fn apply_update(&mut self, update: &GeometryUpdate) -> Vec<Correction> {
        let mut corrections = Vec::new();
        for (parameter, value) in update.iter() {
            corrections.extend(self.assign(parameter, value));
        }
        self.revalidate();
        corrections
    }

    fn assign(&mut self, parameter: GeometryParameter, value: f64) -> Vec<Correction> {
        let (normalized, corrections) = self.normalize_parameter(parameter, value);
        for correction in &corrections {
            info!(
                parameter = %correction.parameter,
                requested = correction.requested,
                applied = correction.applied,
                constraint = %correction.constraint,
                "Geometry parameter corrected"
            );
        }
        *self.slot(parameter) = normalized;
        debug!(parameter = %parameter, value = normalized, "Geometry parameter set");
        corrections
    }

    fn revalidate(&mut self) {
        self.report = self.validate_all_constraints();
        if !self.report.valid {
            debug!(
                violations = self.report.violations.len(),
                "Geometry has constraint violations"
            );
        }
    }
}
