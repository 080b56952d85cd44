//! Commands queued for the next step boundary.

use std::fmt;

use sim_suspension::GeometryUpdate;

use crate::drive::DriveSignal;

/// A change requested from outside the step loop.
///
/// Commands are validated when submitted and applied, in submission order,
/// at the start of the next step.
pub enum SchedulerCommand {
    /// Edit the shared suspension geometry. Every corner linked to the
    /// geometry is rebuilt from the normalized result.
    UpdateGeometry(GeometryUpdate),
    /// Open or close one valve port.
    SetValve {
        /// Cylinder name.
        cylinder: String,
        /// Port name.
        port: String,
        /// New state.
        open: bool,
    },
    /// Hold a lever angle (rad).
    SetLeverAngle {
        /// Cylinder name.
        cylinder: String,
        /// Lever angle.
        angle: f64,
    },
    /// Hold a stroke (m).
    SetStroke {
        /// Cylinder name.
        cylinder: String,
        /// Stroke command.
        stroke: f64,
    },
    /// Replace a corner's drive.
    SetDrive {
        /// Cylinder name.
        cylinder: String,
        /// New drive.
        drive: Box<dyn DriveSignal>,
    },
}

impl SchedulerCommand {
    /// Open or close a valve.
    #[must_use]
    pub fn set_valve(cylinder: impl Into<String>, port: impl Into<String>, open: bool) -> Self {
        Self::SetValve {
            cylinder: cylinder.into(),
            port: port.into(),
            open,
        }
    }

    /// Hold a lever angle.
    #[must_use]
    pub fn set_lever_angle(cylinder: impl Into<String>, angle: f64) -> Self {
        Self::SetLeverAngle {
            cylinder: cylinder.into(),
            angle,
        }
    }

    /// Hold a stroke.
    #[must_use]
    pub fn set_stroke(cylinder: impl Into<String>, stroke: f64) -> Self {
        Self::SetStroke {
            cylinder: cylinder.into(),
            stroke,
        }
    }

    /// Replace a corner's drive.
    #[must_use]
    pub fn set_drive(cylinder: impl Into<String>, drive: impl DriveSignal + 'static) -> Self {
        Self::SetDrive {
            cylinder: cylinder.into(),
            drive: Box::new(drive),
        }
    }

    /// The cylinder this command targets, if any.
    #[must_use]
    pub fn cylinder(&self) -> Option<&str> {
        match self {
            Self::UpdateGeometry(_) => None,
            Self::SetValve { cylinder, .. }
            | Self::SetLeverAngle { cylinder, .. }
            | Self::SetStroke { cylinder, .. }
            | Self::SetDrive { cylinder, .. } => Some(cylinder),
        }
    }
}

impl fmt::Debug for SchedulerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateGeometry(update) => f.debug_tuple("UpdateGeometry").field(update).finish(),
            Self::SetValve {
                cylinder,
                port,
                open,
            } => f
                .debug_struct("SetValve")
                .field("cylinder", cylinder)
                .field("port", port)
                .field("open", open)
                .finish(),
            Self::SetLeverAngle { cylinder, angle } => f
                .debug_struct("SetLeverAngle")
                .field("cylinder", cylinder)
                .field("angle", angle)
                .finish(),
            Self::SetStroke { cylinder, stroke } => f
                .debug_struct("SetStroke")
                .field("cylinder", cylinder)
                .field("stroke", stroke)
                .finish(),
            Self::SetDrive { cylinder, .. } => f
                .debug_struct("SetDrive")
                .field("cylinder", cylinder)
                .finish_non_exhaustive(),
        }
    }
}
