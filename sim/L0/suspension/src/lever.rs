//! Suspension lever kinematics.
//!
//! A corner's lever (trailing arm) rotates about a pivot fixed to the frame.
//! Each corner is described in its own vertical plane:
//!
//! ```text
//!          +y
//!           |
//!   hinge   |  pivot            tip (θ = 0)
//!     o-----+---o=================o   ---> +x (toward adjacent corner)
//!               \
//!                \  θ < 0
//!                 o tip
//! ```
//!
//! The lever angle `θ` is measured from `+x`, counter-clockwise positive, so
//! the arm direction is `(cos θ, sin θ)`. The working range runs from full
//! droop ([`FULL_DROOP_ANGLE`], arm hanging straight down) up to the largest
//! angle at which the tips of two mirrored adjacent levers are still clear of
//! each other ([`LeverKinematics::max_angle_for_wheelbase`]).

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::KinematicsError;
use crate::Result;

/// Lever angle at full droop (rad): the arm hangs straight down.
pub const FULL_DROOP_ANGLE: f64 = -FRAC_PI_2;

/// Fixed geometry of one suspension lever.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeverGeometry {
    /// Pivot position in the corner frame (m).
    pub base_position: Point2<f64>,
    /// Pivot-to-tip arm length (m).
    pub arm_length: f64,
    /// Position of the rod attachment along the arm (0 = pivot, 1 = tip).
    pub rod_attach_fraction: f64,
}

impl LeverGeometry {
    /// Create a lever with its pivot at the corner origin.
    #[must_use]
    pub fn new(arm_length: f64, rod_attach_fraction: f64) -> Self {
        Self {
            base_position: Point2::origin(),
            arm_length,
            rod_attach_fraction,
        }
    }

    /// Set the pivot position.
    #[must_use]
    pub fn with_base_position(mut self, base_position: Point2<f64>) -> Self {
        self.base_position = base_position;
        self
    }

    /// Distance from the pivot to the rod attachment (m).
    #[must_use]
    pub fn rod_attach_radius(&self) -> f64 {
        self.arm_length * self.rod_attach_fraction
    }

    /// Validate the lever dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite values, a non-positive arm length, or an
    /// attachment fraction outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.base_position.x.is_finite() || !self.base_position.y.is_finite() {
            return Err(KinematicsError::non_finite(
                "base_position",
                self.base_position.x + self.base_position.y,
            ));
        }
        if !self.arm_length.is_finite() || self.arm_length <= 0.0 {
            return Err(KinematicsError::invalid_dimension(
                "arm_length",
                self.arm_length,
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.rod_attach_fraction) {
            return Err(KinematicsError::invalid_dimension(
                "rod_attach_fraction",
                self.rod_attach_fraction,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

impl Default for LeverGeometry {
    fn default() -> Self {
        Self::new(0.5, 0.3)
    }
}

/// Lever pose at one angle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeverState {
    /// Lever angle (rad).
    pub angle: f64,
    /// Pivot position (m).
    pub base_position: Point2<f64>,
    /// Position of the rod attachment along the arm.
    pub rod_attach_fraction: f64,
    /// Where the cylinder rod attaches (m).
    pub rod_attachment_point: Point2<f64>,
}

/// Maps lever angle to the rod attachment point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeverKinematics {
    geometry: LeverGeometry,
}

impl LeverKinematics {
    /// Create lever kinematics for the given geometry.
    #[must_use]
    pub const fn new(geometry: LeverGeometry) -> Self {
        Self { geometry }
    }

    /// The lever geometry.
    #[must_use]
    pub const fn geometry(&self) -> &LeverGeometry {
        &self.geometry
    }

    /// Rod attachment point at `angle`.
    ///
    /// ```text
    /// p = base + (L * f) * (cos θ, sin θ)
    /// ```
    ///
    /// The angle must be finite; callers reject NaN and infinities first.
    #[must_use]
    pub fn solve_from_angle(&self, angle: f64) -> Point2<f64> {
        self.point_at_radius(angle, self.geometry.rod_attach_radius())
    }

    /// Lever tip position at `angle`.
    #[must_use]
    pub fn tip_point(&self, angle: f64) -> Point2<f64> {
        self.point_at_radius(angle, self.geometry.arm_length)
    }

    /// Full lever pose at `angle`.
    #[must_use]
    pub fn state(&self, angle: f64) -> LeverState {
        LeverState {
            angle,
            base_position: self.geometry.base_position,
            rod_attach_fraction: self.geometry.rod_attach_fraction,
            rod_attachment_point: self.solve_from_angle(angle),
        }
    }

    /// Largest lever angle before the tips of adjacent corners interfere.
    ///
    /// Adjacent corners are mirror images with pivots one `wheelbase` apart, so
    /// their tips meet at the half gap `g = wheelbase / 2`. The inboard reach
    /// `L * cos θ` grows with `θ` on the working range, giving
    ///
    /// ```text
    /// θ_max = 0                 if L <= g
    /// θ_max = -acos(g / L)      otherwise
    /// ```
    ///
    /// A non-positive or non-finite wheelbase leaves no collision-free travel
    /// and yields [`FULL_DROOP_ANGLE`].
    #[must_use]
    pub fn max_angle_for_wheelbase(wheelbase: f64, lever_geometry: &LeverGeometry) -> f64 {
        let arm = lever_geometry.arm_length;
        if !wheelbase.is_finite() || wheelbase <= 0.0 || !arm.is_finite() || arm <= 0.0 {
            return FULL_DROOP_ANGLE;
        }
        let half_gap = wheelbase / 2.0;
        if arm <= half_gap {
            0.0
        } else {
            -(half_gap / arm).acos()
        }
    }

    /// Working angle range `[full droop, θ_max]` for the given wheelbase.
    #[must_use]
    pub fn angle_range(&self, wheelbase: f64) -> (f64, f64) {
        (
            FULL_DROOP_ANGLE,
            Self::max_angle_for_wheelbase(wheelbase, &self.geometry),
        )
    }

    fn point_at_radius(&self, angle: f64, radius: f64) -> Point2<f64> {
        let (sin, cos) = angle.sin_cos();
        self.geometry.base_position + Vector2::new(cos, sin) * radius
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_from_angle() {
        let lever = LeverKinematics::new(
            LeverGeometry::new(0.5, 0.4).with_base_position(Point2::new(1.0, 2.0)),
        );

        let p = lever.solve_from_angle(0.0);
        assert_relative_eq!(p.x, 1.2, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);

        let p = lever.solve_from_angle(FULL_DROOP_ANGLE);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.8, epsilon = 1e-12);
    }

    #[test]
    fn test_attachment_stays_on_circle() {
        let lever = LeverKinematics::new(LeverGeometry::new(0.6, 0.5));
        for i in 0..=20 {
            let angle = FULL_DROOP_ANGLE + f64::from(i) * 0.1;
            let p = lever.solve_from_angle(angle);
            assert_relative_eq!(p.coords.norm(), 0.3, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tip_is_at_arm_length() {
        let lever = LeverKinematics::new(LeverGeometry::new(0.6, 0.5));
        assert_relative_eq!(lever.tip_point(-0.3).coords.norm(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_state_carries_geometry() {
        let lever = LeverKinematics::new(LeverGeometry::default());
        let state = lever.state(-0.2);
        assert_eq!(state.angle, -0.2);
        assert_eq!(state.rod_attach_fraction, 0.3);
        assert_eq!(state.rod_attachment_point, lever.solve_from_angle(-0.2));
    }

    #[test]
    fn test_short_lever_has_full_travel() {
        let geometry = LeverGeometry::new(0.5, 0.3);
        assert_eq!(LeverKinematics::max_angle_for_wheelbase(2.5, &geometry), 0.0);
    }

    #[test]
    fn test_long_lever_is_limited() {
        let geometry = LeverGeometry::new(2.0, 0.3);
        let max = LeverKinematics::max_angle_for_wheelbase(2.0, &geometry);

        // Tip reach at the limit equals the half gap
        assert_relative_eq!(2.0 * max.cos(), 1.0, epsilon = 1e-12);
        assert!(max < 0.0 && max > FULL_DROOP_ANGLE);
    }

    #[test]
    fn test_limit_shrinks_with_wheelbase() {
        let geometry = LeverGeometry::new(2.0, 0.3);
        let wide = LeverKinematics::max_angle_for_wheelbase(3.5, &geometry);
        let narrow = LeverKinematics::max_angle_for_wheelbase(1.0, &geometry);
        assert!(narrow < wide);
    }

    #[test]
    fn test_degenerate_wheelbase() {
        let geometry = LeverGeometry::default();
        assert_eq!(
            LeverKinematics::max_angle_for_wheelbase(0.0, &geometry),
            FULL_DROOP_ANGLE
        );
        assert_eq!(
            LeverKinematics::max_angle_for_wheelbase(f64::NAN, &geometry),
            FULL_DROOP_ANGLE
        );
    }

    #[test]
    fn test_validate() {
        assert!(LeverGeometry::default().validate().is_ok());
        assert!(LeverGeometry::new(0.0, 0.3).validate().is_err());
        assert!(LeverGeometry::new(0.5, 1.5).validate().is_err());
        assert!(LeverGeometry::new(0.5, 0.3)
            .with_base_position(Point2::new(f64::NAN, 0.0))
            .validate()
            .is_err());
    }
}
