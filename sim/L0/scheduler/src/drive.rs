//! Per-step drive sources for a corner.

use std::f64::consts::TAU;
use std::fmt;

use sim_pneumatic::Drive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Produces the stroke or lever-angle command for each step.
///
/// `time` is the simulated time at the end of the step being computed.
pub trait DriveSignal: Send {
    /// Command for the step ending at `time` (s).
    fn sample(&mut self, time: f64) -> Drive;
}

impl fmt::Debug for dyn DriveSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DriveSignal")
    }
}

/// A constant command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeldDrive(pub Drive);

impl HeldDrive {
    /// Hold a lever angle (rad).
    #[must_use]
    pub const fn lever_angle(angle: f64) -> Self {
        Self(Drive::LeverAngle(angle))
    }

    /// Hold a stroke (m).
    #[must_use]
    pub const fn stroke(stroke: f64) -> Self {
        Self(Drive::Stroke(stroke))
    }
}

impl DriveSignal for HeldDrive {
    fn sample(&mut self, _time: f64) -> Drive {
        self.0
    }
}

/// Sinusoidal oscillation about a center command.
///
/// ```text
/// command(t) = center + amplitude * sin(2π f t + phase)
/// ```
///
/// The center's variant decides whether the output is a lever angle or a
/// stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SineDrive {
    /// Command at zero phase.
    pub center: Drive,
    /// Peak offset (rad or m, matching `center`).
    pub amplitude: f64,
    /// Frequency (Hz).
    pub frequency: f64,
    /// Phase offset (rad).
    pub phase: f64,
}

impl SineDrive {
    /// Create a sine drive with zero phase.
    #[must_use]
    pub const fn new(center: Drive, amplitude: f64, frequency: f64) -> Self {
        Self {
            center,
            amplitude,
            frequency,
            phase: 0.0,
        }
    }

    /// Lever oscillation about `center` (rad).
    #[must_use]
    pub const fn lever(center: f64, amplitude: f64, frequency: f64) -> Self {
        Self::new(Drive::LeverAngle(center), amplitude, frequency)
    }

    /// Set the phase offset.
    #[must_use]
    pub const fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Command at `time` without mutating the drive.
    #[must_use]
    pub fn at(&self, time: f64) -> Drive {
        let offset = self.amplitude * TAU.mul_add(self.frequency * time, self.phase).sin();
        match self.center {
            Drive::LeverAngle(angle) => Drive::LeverAngle(angle + offset),
            Drive::Stroke(stroke) => Drive::Stroke(stroke + offset),
        }
    }
}

impl DriveSignal for SineDrive {
    fn sample(&mut self, time: f64) -> Drive {
        self.at(time)
    }
}

/// A drive backed by a closure. Built with [`drive_fn`].
pub struct DriveFn<F>(F);

impl<F> fmt::Debug for DriveFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DriveFn")
    }
}

/// Wrap a closure of simulated time as a [`DriveSignal`].
///
/// ```
/// use sim_pneumatic::Drive;
/// use sim_scheduler::{drive_fn, DriveSignal};
///
/// let mut ramp = drive_fn(|t| Drive::Stroke(0.05 + 0.1 * t));
/// assert_eq!(ramp.sample(0.5), Drive::Stroke(0.1));
/// ```
pub fn drive_fn<F>(f: F) -> DriveFn<F>
where
    F: FnMut(f64) -> Drive + Send,
{
    DriveFn(f)
}

impl<F> DriveSignal for DriveFn<F>
where
    F: FnMut(f64) -> Drive + Send,
{
    fn sample(&mut self, time: f64) -> Drive {
        (self.0)(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn angle(drive: Drive) -> f64 {
        match drive {
            Drive::LeverAngle(a) => a,
            Drive::Stroke(_) => f64::NAN,
        }
    }

    #[test]
    fn test_held_drive() {
        let mut drive = HeldDrive::stroke(0.1);
        assert_eq!(drive.sample(0.0), Drive::Stroke(0.1));
        assert_eq!(drive.sample(10.0), Drive::Stroke(0.1));
    }

    #[test]
    fn test_sine_drive_peaks() {
        let mut drive = SineDrive::lever(-0.5, 0.2, 1.0);
        assert_relative_eq!(angle(drive.sample(0.0)), -0.5, epsilon = 1e-12);
        assert_relative_eq!(angle(drive.sample(0.25)), -0.3, epsilon = 1e-12);
        assert_relative_eq!(angle(drive.sample(0.75)), -0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_sine_drive_keeps_variant() {
        let drive =
            SineDrive::new(Drive::Stroke(0.1), 0.02, 2.0).with_phase(std::f64::consts::FRAC_PI_2);
        match drive.at(0.0) {
            Drive::Stroke(s) => assert_relative_eq!(s, 0.12, epsilon = 1e-12),
            Drive::LeverAngle(_) => panic!("expected a stroke command"),
        }
    }

    #[test]
    fn test_closure_drive_keeps_state() {
        let mut calls = 0_u32;
        let mut drive = drive_fn(move |t| {
            calls += 1;
            Drive::Stroke(t * f64::from(calls))
        });
        assert_eq!(drive.sample(1.0), Drive::Stroke(1.0));
        assert_eq!(drive.sample(1.0), Drive::Stroke(2.0));
    }

    #[test]
    fn test_boxed_drive() {
        let mut boxed: Box<dyn DriveSignal> = Box::new(HeldDrive::lever_angle(-0.4));
        assert_eq!(boxed.sample(0.0), Drive::LeverAngle(-0.4));
        assert_eq!(format!("{boxed:?}"), "DriveSignal");
    }
}
