//! Lever angle to stroke, behind a capability trait.
//!
//! Consumers such as the pneumatic cylinder only need three answers from the
//! suspension geometry: where the rod attaches, what stroke that implies, and
//! which angles are legal. [`KinematicsProvider`] names that capability;
//! [`LeverCylinderKinematics`] is the lever-plus-cylinder implementation.

use std::fmt::Debug;

use nalgebra::Point2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cylinder::{CylinderKinematics, StrokeBounds};
use crate::error::KinematicsError;
use crate::lever::LeverKinematics;
use crate::Result;

/// Maps a lever angle to cylinder stroke.
pub trait KinematicsProvider: Debug + Send + Sync {
    /// Rod attachment point at `angle`.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::NonFiniteInput`] for a NaN or infinite angle.
    fn attachment_point(&self, angle: f64) -> Result<Point2<f64>>;

    /// Unclamped stroke at `angle`.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::NonFiniteInput`] for a NaN or infinite angle.
    fn stroke_at_angle(&self, angle: f64) -> Result<f64>;

    /// Collision-free lever angle range `(min, max)` in radians.
    fn angle_range(&self) -> (f64, f64);

    /// Usable stroke range of the cylinder.
    fn stroke_bounds(&self) -> StrokeBounds;

    /// Stroke reached at the upper end of the angle range.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::stroke_at_angle`].
    fn max_kinematic_stroke(&self) -> Result<f64> {
        self.stroke_at_angle(self.angle_range().1)
    }
}

/// A lever driving a cylinder hinged to the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeverCylinderKinematics {
    lever: LeverKinematics,
    cylinder: CylinderKinematics,
    frame_hinge: Point2<f64>,
    angle_range: (f64, f64),
    bounds: StrokeBounds,
}

impl LeverCylinderKinematics {
    /// Combine a lever and a cylinder.
    ///
    /// `wheelbase` fixes the collision-free angle range.
    ///
    /// # Errors
    ///
    /// Returns an error if the lever or cylinder dimensions are invalid, in
    /// particular [`KinematicsError::DegenerateGeometry`] for a cylinder with
    /// an empty stroke range.
    pub fn new(
        lever: LeverKinematics,
        cylinder: CylinderKinematics,
        frame_hinge: Point2<f64>,
        wheelbase: f64,
    ) -> Result<Self> {
        lever.geometry().validate()?;
        cylinder.validate()?;
        if !frame_hinge.x.is_finite() || !frame_hinge.y.is_finite() {
            return Err(KinematicsError::non_finite(
                "frame_hinge",
                frame_hinge.x + frame_hinge.y,
            ));
        }
        let bounds = cylinder.bounds()?;
        let angle_range = lever.angle_range(wheelbase);
        Ok(Self {
            lever,
            cylinder,
            frame_hinge,
            angle_range,
            bounds,
        })
    }

    /// The lever solver.
    #[must_use]
    pub const fn lever(&self) -> &LeverKinematics {
        &self.lever
    }

    /// The cylinder solver.
    #[must_use]
    pub const fn cylinder(&self) -> &CylinderKinematics {
        &self.cylinder
    }

    /// Where the cylinder body is hinged to the frame.
    #[must_use]
    pub const fn frame_hinge(&self) -> Point2<f64> {
        self.frame_hinge
    }
}

impl KinematicsProvider for LeverCylinderKinematics {
    fn attachment_point(&self, angle: f64) -> Result<Point2<f64>> {
        if !angle.is_finite() {
            return Err(KinematicsError::non_finite("lever_angle", angle));
        }
        Ok(self.lever.solve_from_angle(angle))
    }

    fn stroke_at_angle(&self, angle: f64) -> Result<f64> {
        let attachment = self.attachment_point(angle)?;
        Ok(self
            .cylinder
            .stroke_from_attachment(&self.frame_hinge, &attachment))
    }

    fn angle_range(&self) -> (f64, f64) {
        self.angle_range
    }

    fn stroke_bounds(&self) -> StrokeBounds {
        self.bounds
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::cylinder::DeadZone;
    use crate::lever::{LeverGeometry, FULL_DROOP_ANGLE};
    use approx::assert_relative_eq;

    fn provider() -> LeverCylinderKinematics {
        LeverCylinderKinematics::new(
            LeverKinematics::new(LeverGeometry::new(0.5, 0.3)),
            CylinderKinematics::default(),
            Point2::new(-0.1, 0.0),
            2.5,
        )
        .unwrap()
    }

    #[test]
    fn test_stroke_matches_law_of_cosines() {
        let kin = provider();
        let (a, h) = (0.15_f64, 0.1_f64);
        for angle in [FULL_DROOP_ANGLE, -1.0, -0.5, 0.0] {
            let distance = (a * a + h * h + 2.0 * a * h * angle.cos()).sqrt();
            assert_relative_eq!(
                kin.stroke_at_angle(angle).unwrap(),
                distance - 0.004,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_stroke_increases_over_range() {
        let kin = provider();
        let (lo, hi) = kin.angle_range();
        assert_eq!(lo, FULL_DROOP_ANGLE);
        assert_eq!(hi, 0.0);
        assert!(kin.stroke_at_angle(lo).unwrap() < kin.stroke_at_angle(hi).unwrap());
        assert_relative_eq!(kin.max_kinematic_stroke().unwrap(), 0.246, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_finite_angle() {
        let kin = provider();
        assert!(matches!(
            kin.stroke_at_angle(f64::NAN),
            Err(KinematicsError::NonFiniteInput { .. })
        ));
        assert!(kin.attachment_point(f64::INFINITY).is_err());
    }

    #[test]
    fn test_degenerate_cylinder_fails_construction() {
        let cylinder = CylinderKinematics::new(0.08, 0.035, 0.02, 0.02)
            .with_dead_zones(DeadZone::Length(0.002), DeadZone::Length(0.002));
        let err = LeverCylinderKinematics::new(
            LeverKinematics::new(LeverGeometry::default()),
            cylinder,
            Point2::origin(),
            2.5,
        )
        .unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_usable_as_trait_object() {
        let boxed: Box<dyn KinematicsProvider> = Box::new(provider());
        assert_relative_eq!(boxed.stroke_bounds().max, 0.278, epsilon = 1e-12);
    }
}
