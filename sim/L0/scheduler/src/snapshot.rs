//! Per-step snapshots and per-tick reports.

use sim_pneumatic::CylinderSnapshot;
use sim_suspension::{ConstraintViolation, Correction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immutable view of every corner after one completed step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepSnapshot {
    /// Step number, starting at 1.
    pub step: u64,
    /// Simulated time at the end of the step (s).
    pub time: f64,
    /// One entry per corner, in insertion order.
    pub cylinders: Vec<CylinderSnapshot>,
    /// Geometry corrections applied at this step's boundary.
    pub corrections: Vec<Correction>,
    /// Clamped commands and failed geometry checks from this step.
    pub violations: Vec<ConstraintViolation>,
}

impl StepSnapshot {
    /// Look up a corner by cylinder name.
    #[must_use]
    pub fn cylinder(&self, name: &str) -> Option<&CylinderSnapshot> {
        self.cylinders.iter().find(|c| c.name == name)
    }

    /// No corrections and no violations.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty() && self.violations.is_empty()
    }
}

/// A tick that could not keep up with wall time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverloadEvent {
    /// Step count when the backlog was dropped.
    pub step: u64,
    /// Steps the tick executed before giving up.
    pub steps_executed: u32,
    /// Wall time dropped (s).
    pub discarded_time: f64,
}

/// Outcome of one [`tick`](crate::SimulationScheduler::tick).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickReport {
    /// Steps executed.
    pub steps_executed: u32,
    /// Set when the backlog was dropped.
    pub overload: Option<OverloadEvent>,
    /// One snapshot per executed step, oldest first.
    pub snapshots: Vec<StepSnapshot>,
    /// A stop request was honored during this tick.
    pub stopped: bool,
}

impl TickReport {
    /// The most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&StepSnapshot> {
        self.snapshots.last()
    }

    /// Corrections from every step of the tick.
    pub fn corrections(&self) -> impl Iterator<Item = &Correction> + '_ {
        self.snapshots.iter().flat_map(|s| s.corrections.iter())
    }

    /// Violations from every step of the tick.
    pub fn violations(&self) -> impl Iterator<Item = &ConstraintViolation> + '_ {
        self.snapshots.iter().flat_map(|s| s.violations.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_suspension::ConstraintKind;

    fn snapshot(step: u32) -> StepSnapshot {
        StepSnapshot {
            step: u64::from(step),
            time: f64::from(step) * 0.001,
            cylinders: vec![CylinderSnapshot {
                name: "front_left".into(),
                stroke: 0.1,
                head_pressure: 300_000.0,
                rod_pressure: 300_000.0,
                net_force: 1000.0,
            }],
            corrections: Vec::new(),
            violations: Vec::new(),
        }
    }

    #[test]
    fn test_snapshot_lookup() {
        let snap = snapshot(1);
        assert!(snap.cylinder("front_left").is_some());
        assert!(snap.cylinder("rear_left").is_none());
        assert!(snap.is_clean());
    }

    #[test]
    fn test_report_aggregates_steps() {
        let mut second = snapshot(2);
        second
            .violations
            .push(ConstraintViolation::new(ConstraintKind::Kinematic, "clamped"));
        let report = TickReport {
            steps_executed: 2,
            overload: None,
            snapshots: vec![snapshot(1), second],
            stopped: false,
        };
        assert_eq!(report.latest().map(|s| s.step), Some(2));
        assert_eq!(report.violations().count(), 1);
        assert_eq!(report.corrections().count(), 0);
    }
}
