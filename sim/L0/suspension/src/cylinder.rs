//! Cylinder kinematics: attachment distance to piston stroke.
//!
//! The cylinder body hangs from a hinge on the frame and its rod is pinned to
//! the lever. Stroke is measured from the fully-retracted position, so it is
//! the hinge-to-attachment distance minus the unusable dead-zone length at
//! each end of the bore.
//!
//! # Chamber layout
//!
//! ```text
//!  hinge                                                   rod end
//!    |<------------------------ body_length ------------------->|
//!    [ dead_head | head chamber  ][piston][  rod chamber | dead_rod ]
//! ```
//!
//! With `x` the stroke, the head chamber length is `x - L_dead_rod +
//! L_dead_head` and the rod chamber takes the rest of `body - piston`. At the
//! bounds `x_min = L_dead_rod` and `x_max = body - piston - L_dead_head`, each
//! chamber keeps exactly its dead-zone length.

use std::f64::consts::PI;

use nalgebra::Point2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::KinematicsError;
use crate::Result;

/// Areas below this are treated as zero cross-section.
pub const AREA_EPSILON: f64 = 1e-12;

// ============================================================================
// Dead zones
// ============================================================================

/// Unusable space at one end of a chamber.
///
/// Port and fitting volume is often specified as a volume; the kinematics
/// works with its equivalent length `L = V / A` over the chamber's area.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeadZone {
    /// Dead zone given directly as a length (m).
    Length(f64),
    /// Dead zone given as a volume (m³).
    Volume(f64),
}

impl DeadZone {
    /// Equivalent length over a chamber of cross-section `area`.
    ///
    /// A volume over a degenerate area has no meaningful length and maps to 0.
    #[must_use]
    pub fn length(&self, area: f64) -> f64 {
        match *self {
            Self::Length(length) => length,
            Self::Volume(volume) => {
                if area > AREA_EPSILON {
                    volume / area
                } else {
                    0.0
                }
            }
        }
    }

    /// The raw value, in m or m³.
    #[must_use]
    pub const fn value(&self) -> f64 {
        match *self {
            Self::Length(v) | Self::Volume(v) => v,
        }
    }
}

impl Default for DeadZone {
    fn default() -> Self {
        Self::Length(0.0)
    }
}

// ============================================================================
// Derived quantities
// ============================================================================

/// Piston cross-sections of the two chambers (m²).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChamberAreas {
    /// Full bore area on the head side.
    pub head: f64,
    /// Annulus area on the rod side.
    pub rod: f64,
}

impl ChamberAreas {
    /// Areas for the given bore and rod diameters.
    #[must_use]
    pub fn from_diameters(bore_diameter: f64, rod_diameter: f64) -> Self {
        let head = PI * bore_diameter * bore_diameter / 4.0;
        let rod = PI * (bore_diameter * bore_diameter - rod_diameter * rod_diameter) / 4.0;
        Self {
            head: head.max(0.0),
            rod: rod.max(0.0),
        }
    }
}

/// Chamber lengths (m) or volumes (m³), head side and rod side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChamberPair {
    /// Head-side value.
    pub head: f64,
    /// Rod-side value.
    pub rod: f64,
}

/// Usable stroke range `[min, max]` (m).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrokeBounds {
    /// Minimum stroke.
    pub min: f64,
    /// Maximum stroke.
    pub max: f64,
}

impl StrokeBounds {
    /// Whether `stroke` lies inside the range.
    #[must_use]
    pub fn contains(&self, stroke: f64) -> bool {
        stroke >= self.min && stroke <= self.max
    }

    /// Clamp `stroke` into the range.
    #[must_use]
    pub fn clamp(&self, stroke: f64) -> f64 {
        stroke.clamp(self.min, self.max)
    }

    /// Width of the range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

// ============================================================================
// CylinderKinematics
// ============================================================================

/// Dimensions of a double-acting cylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CylinderKinematics {
    /// Bore diameter (m).
    pub bore_diameter: f64,
    /// Rod diameter (m).
    pub rod_diameter: f64,
    /// Inner body length (m).
    pub body_length: f64,
    /// Piston thickness (m).
    pub piston_thickness: f64,
    /// Dead zone at the rod end.
    pub dead_zone_rod: DeadZone,
    /// Dead zone at the head end.
    pub dead_zone_head: DeadZone,
}

impl CylinderKinematics {
    /// Create cylinder kinematics with no dead zones.
    #[must_use]
    pub fn new(bore_diameter: f64, rod_diameter: f64, body_length: f64, piston_thickness: f64) -> Self {
        Self {
            bore_diameter,
            rod_diameter,
            body_length,
            piston_thickness,
            dead_zone_rod: DeadZone::default(),
            dead_zone_head: DeadZone::default(),
        }
    }

    /// Set the dead zones (rod end, head end).
    #[must_use]
    pub fn with_dead_zones(mut self, rod: DeadZone, head: DeadZone) -> Self {
        self.dead_zone_rod = rod;
        self.dead_zone_head = head;
        self
    }

    /// Chamber cross-sections.
    #[must_use]
    pub fn areas(&self) -> ChamberAreas {
        ChamberAreas::from_diameters(self.bore_diameter, self.rod_diameter)
    }

    /// Dead-zone lengths `(rod end, head end)` in metres.
    #[must_use]
    pub fn dead_zone_lengths(&self) -> (f64, f64) {
        let areas = self.areas();
        (
            self.dead_zone_rod.length(areas.rod),
            self.dead_zone_head.length(areas.head),
        )
    }

    /// Stroke for a given hinge and rod attachment point.
    ///
    /// The result is not clamped; compare against [`Self::bounds`].
    #[must_use]
    pub fn stroke_from_attachment(
        &self,
        frame_hinge: &Point2<f64>,
        attachment_point: &Point2<f64>,
    ) -> f64 {
        let (dead_rod, dead_head) = self.dead_zone_lengths();
        nalgebra::distance(frame_hinge, attachment_point) - (dead_rod + dead_head)
    }

    /// Usable stroke range from dead-zone lengths.
    ///
    /// `x_min = dead_zone_rod`, `x_max = max(x_min, body - piston - dead_zone_head)`.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::NonFiniteInput`] for NaN or infinite input,
    /// [`KinematicsError::InvalidDimension`] for negative dimensions, and
    /// [`KinematicsError::DegenerateGeometry`] when the body is too short to
    /// hold the piston and both dead zones.
    pub fn stroke_bounds(
        body_length: f64,
        piston_thickness: f64,
        dead_zone_rod: f64,
        dead_zone_head: f64,
    ) -> Result<StrokeBounds> {
        for (name, value) in [
            ("body_length", body_length),
            ("piston_thickness", piston_thickness),
            ("dead_zone_rod", dead_zone_rod),
            ("dead_zone_head", dead_zone_head),
        ] {
            if !value.is_finite() {
                return Err(KinematicsError::non_finite(name, value));
            }
            if value < 0.0 {
                return Err(KinematicsError::invalid_dimension(
                    name,
                    value,
                    "must not be negative",
                ));
            }
        }

        let x_min = dead_zone_rod;
        let free_travel = body_length - piston_thickness - dead_zone_head;
        if free_travel < x_min {
            return Err(KinematicsError::degenerate(
                x_min,
                free_travel,
                format!(
                    "body {body_length} cannot hold piston {piston_thickness} \
                     and dead zones {dead_zone_rod} + {dead_zone_head}"
                ),
            ));
        }

        Ok(StrokeBounds {
            min: x_min,
            max: free_travel.max(x_min),
        })
    }

    /// Usable stroke range of this cylinder.
    ///
    /// # Errors
    ///
    /// See [`Self::stroke_bounds`].
    pub fn bounds(&self) -> Result<StrokeBounds> {
        let (dead_rod, dead_head) = self.dead_zone_lengths();
        Self::stroke_bounds(self.body_length, self.piston_thickness, dead_rod, dead_head)
    }

    /// Chamber lengths at `stroke`, floored at zero.
    #[must_use]
    pub fn chamber_lengths(&self, stroke: f64) -> ChamberPair {
        let (dead_rod, dead_head) = self.dead_zone_lengths();
        let head = stroke - dead_rod + dead_head;
        let rod = self.body_length - self.piston_thickness - head;
        ChamberPair {
            head: head.max(0.0),
            rod: rod.max(0.0),
        }
    }

    /// Chamber volumes at `stroke`.
    #[must_use]
    pub fn chamber_volumes(&self, stroke: f64) -> ChamberPair {
        let lengths = self.chamber_lengths(stroke);
        let areas = self.areas();
        ChamberPair {
            head: lengths.head * areas.head,
            rod: lengths.rod * areas.rod,
        }
    }

    /// Validate diameters and lengths, then the stroke range.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive diameters, a rod at least as wide as
    /// the bore, or any error from [`Self::bounds`].
    pub fn validate(&self) -> Result<()> {
        if !self.bore_diameter.is_finite() || self.bore_diameter <= 0.0 {
            return Err(KinematicsError::invalid_dimension(
                "bore_diameter",
                self.bore_diameter,
                "must be positive",
            ));
        }
        if !self.rod_diameter.is_finite() || self.rod_diameter < 0.0 {
            return Err(KinematicsError::invalid_dimension(
                "rod_diameter",
                self.rod_diameter,
                "must not be negative",
            ));
        }
        if self.rod_diameter >= self.bore_diameter {
            return Err(KinematicsError::invalid_dimension(
                "rod_diameter",
                self.rod_diameter,
                "must be smaller than the bore",
            ));
        }
        self.bounds().map(|_| ())
    }
}

impl Default for CylinderKinematics {
    /// 80 mm bore, 35 mm rod, 300 mm body, 20 mm piston, 2 mm dead zones.
    fn default() -> Self {
        Self::new(0.08, 0.035, 0.30, 0.02)
            .with_dead_zones(DeadZone::Length(0.002), DeadZone::Length(0.002))
    }
}
