//! Fixed-timestep scheduler over a set of suspension corners.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Running --pause--> Paused
//!                    ^                  |
//!                    +-----resume-------+
//! Idle | Running | Paused --stop--> Stopped (terminal)
//! ```
//!
//! # Tick
//!
//! [`SimulationScheduler::tick`] adds wall time to the clock and runs whole
//! steps while time is due and the step budget lasts. Each step:
//!
//! 1. Honors a pending stop request.
//! 2. Applies queued commands in submission order.
//! 3. Advances every corner on copies, then commits them together.
//! 4. Publishes a [`StepSnapshot`].
//!
//! If the budget runs out with more than `max_frame_time` still waiting, the
//! whole backlog is dropped and an [`OverloadEvent`] is reported.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sim_pneumatic::{Drive, PneumaticCylinder, PneumaticError, ValveStates};
use sim_suspension::{ConstraintKind, ConstraintViolation, Correction, GeometryState};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::clock::SimulationClock;
use crate::command::SchedulerCommand;
use crate::config::SchedulerConfig;
use crate::drive::{DriveSignal, HeldDrive};
use crate::error::SchedulerError;
use crate::snapshot::{OverloadEvent, StepSnapshot, TickReport};
use crate::Result;

// ============================================================================
// Lifecycle
// ============================================================================

/// Where the scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SchedulerState {
    /// Built, not yet started.
    Idle,
    /// Ticks execute steps.
    Running,
    /// Ticks are ignored; the clock does not accumulate.
    Paused,
    /// Terminal.
    Stopped,
}

impl SchedulerState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Whether `to` is reachable in one transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Idle | Self::Paused, Self::Running)
                | (Self::Running, Self::Paused)
                | (Self::Idle | Self::Running | Self::Paused, Self::Stopped)
        )
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared flag for stopping a scheduler from another thread.
///
/// The scheduler checks it at every step boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the scheduler to stop at its next step boundary.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ============================================================================
// Corners
// ============================================================================

/// One cylinder with its valves and drive.
#[derive(Debug)]
struct Corner {
    cylinder: PneumaticCylinder,
    valves: ValveStates,
    drive: Box<dyn DriveSignal>,
    /// Rebuilt from the shared geometry on every geometry update.
    linked: bool,
}

impl Corner {
    fn new(cylinder: PneumaticCylinder, linked: bool) -> Self {
        let hold = HeldDrive::stroke(cylinder.state().stroke);
        Self {
            cylinder,
            valves: ValveStates::new(),
            drive: Box::new(hold),
            linked,
        }
    }
}

fn relink(
    corners: &mut [Corner],
    geometry: &GeometryState,
    violations: &mut Vec<ConstraintViolation>,
) {
    for corner in corners.iter_mut().filter(|c| c.linked) {
        if let Err(err) = corner.cylinder.apply_geometry(geometry) {
            warn!(
                cylinder = %corner.cylinder.name(),
                error = %err,
                "Geometry not applied; cylinder keeps its previous dimensions"
            );
            violations.push(ConstraintViolation::new(
                ConstraintKind::Cylindrical,
                format!("{}: {err}", corner.cylinder.name()),
            ));
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Advances every corner at a fixed timestep, decoupled from the caller's
/// tick rate.
///
/// # Example
///
/// ```
/// use sim_pneumatic::{CylinderSpec, PneumaticCylinder};
/// use sim_scheduler::{SchedulerCommand, SchedulerConfig, SimulationScheduler};
///
/// let mut scheduler = SimulationScheduler::new(SchedulerConfig::default())?;
/// scheduler.add_corner(PneumaticCylinder::new("front_left", CylinderSpec::default())?)?;
/// scheduler.submit(SchedulerCommand::set_stroke("front_left", 0.1))?;
/// scheduler.start()?;
///
/// let report = scheduler.tick(0.016)?;
/// assert_eq!(report.steps_executed, 16);
/// # Ok::<(), sim_scheduler::SchedulerError>(())
/// ```
#[derive(Debug)]
pub struct SimulationScheduler {
    config: SchedulerConfig,
    clock: SimulationClock,
    state: SchedulerState,
    geometry: GeometryState,
    corners: Vec<Corner>,
    pending: Vec<SchedulerCommand>,
    stop: StopHandle,
    latest: Option<StepSnapshot>,
}

impl SimulationScheduler {
    /// Create an idle scheduler with the default geometry and no corners.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for an invalid config.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock: SimulationClock::new(&config),
            state: SchedulerState::Idle,
            geometry: GeometryState::default(),
            corners: Vec::new(),
            pending: Vec::new(),
            stop: StopHandle::default(),
            latest: None,
        })
    }

    /// Replace the shared geometry and rebuild linked corners from it.
    ///
    /// # Errors
    ///
    /// Returns the first corner rebuild error.
    pub fn with_geometry(mut self, geometry: GeometryState) -> Result<Self> {
        for corner in self.corners.iter_mut().filter(|c| c.linked) {
            corner.cylinder.apply_geometry(&geometry)?;
        }
        self.geometry = geometry;
        Ok(self)
    }

    /// Add a corner with its own fixed dimensions.
    ///
    /// It holds its current stroke until a command says otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateCylinder`] if the name is taken.
    pub fn add_corner(&mut self, cylinder: PneumaticCylinder) -> Result<()> {
        self.check_unique(cylinder.name())?;
        debug!(cylinder = %cylinder.name(), "Corner added");
        self.corners.push(Corner::new(cylinder, false));
        Ok(())
    }

    /// Add a corner that follows the shared geometry.
    ///
    /// The geometry is applied now and again after every geometry update,
    /// which also gives the cylinder lever-angle kinematics.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateCylinder`] if the name is taken, or
    /// the error from applying the geometry.
    pub fn add_linked_corner(&mut self, mut cylinder: PneumaticCylinder) -> Result<()> {
        self.check_unique(cylinder.name())?;
        cylinder.apply_geometry(&self.geometry)?;
        debug!(cylinder = %cylinder.name(), "Linked corner added");
        self.corners.push(Corner::new(cylinder, true));
        Ok(())
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.corner(name).is_some() {
            Err(SchedulerError::DuplicateCylinder(name.to_string()))
        } else {
            Ok(())
        }
    }

    fn corner(&self, name: &str) -> Option<&Corner> {
        self.corners.iter().find(|c| c.cylinder.name() == name)
    }

    fn corner_mut(&mut self, name: &str) -> Option<&mut Corner> {
        self.corners.iter_mut().find(|c| c.cylinder.name() == name)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Queue a command for the next step boundary.
    ///
    /// A drive is checked by its first sample.
    ///
    /// # Errors
    ///
    /// Rejects, without queueing, commands for an unknown cylinder or port,
    /// non-finite commands, and lever-angle commands or drives for a corner
    /// without kinematics.
    pub fn submit(&mut self, mut command: SchedulerCommand) -> Result<()> {
        let time = self.clock.next_time();
        if let Some(name) = command.cylinder().map(str::to_string) {
            let corner = self
                .corner(&name)
                .ok_or(SchedulerError::UnknownCylinder(name))?;
            match &mut command {
                SchedulerCommand::SetValve { port, .. } => corner.cylinder.check_port(port)?,
                SchedulerCommand::SetLeverAngle { angle, .. } => {
                    check_drive(&corner.cylinder, Drive::LeverAngle(*angle))?;
                }
                SchedulerCommand::SetStroke { stroke, .. } => {
                    check_drive(&corner.cylinder, Drive::Stroke(*stroke))?;
                }
                SchedulerCommand::SetDrive { drive, .. } => {
                    check_drive(&corner.cylinder, drive.sample(time))?;
                }
                SchedulerCommand::UpdateGeometry(_) => {}
            }
        }
        debug!(command = ?command, "Command queued");
        self.pending.push(command);
        Ok(())
    }

    /// Commands waiting for the next step.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    fn apply_pending(
        &mut self,
        corrections: &mut Vec<Correction>,
        violations: &mut Vec<ConstraintViolation>,
    ) {
        for command in std::mem::take(&mut self.pending) {
            match command {
                SchedulerCommand::UpdateGeometry(update) => {
                    corrections.extend(self.geometry.apply_update(&update));
                    violations.extend(self.geometry.report().violations.iter().cloned());
                    relink(&mut self.corners, &self.geometry, violations);
                }
                SchedulerCommand::SetValve {
                    cylinder,
                    port,
                    open,
                } => {
                    if let Some(corner) = self.corner_mut(&cylinder) {
                        corner.valves.set(port, open);
                    }
                }
                SchedulerCommand::SetLeverAngle { cylinder, angle } => {
                    if let Some(corner) = self.corner_mut(&cylinder) {
                        corner.drive = Box::new(HeldDrive::lever_angle(angle));
                    }
                }
                SchedulerCommand::SetStroke { cylinder, stroke } => {
                    if let Some(corner) = self.corner_mut(&cylinder) {
                        corner.drive = Box::new(HeldDrive::stroke(stroke));
                    }
                }
                SchedulerCommand::SetDrive { cylinder, drive } => {
                    if let Some(corner) = self.corner_mut(&cylinder) {
                        corner.drive = drive;
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    fn transition(&mut self, to: SchedulerState) -> Result<()> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(SchedulerError::invalid_transition(from, to));
        }
        self.state = to;
        info!(from = %from, to = %to, step = self.clock.step_count(), "Scheduler state changed");
        Ok(())
    }

    /// Idle to running.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidTransition`] unless idle.
    pub fn start(&mut self) -> Result<()> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::invalid_transition(
                self.state,
                SchedulerState::Running,
            ));
        }
        self.transition(SchedulerState::Running)
    }

    /// Running to paused.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidTransition`] unless running.
    pub fn pause(&mut self) -> Result<()> {
        self.transition(SchedulerState::Paused)
    }

    /// Paused to running. Wall time that passed while paused is not
    /// simulated.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidTransition`] unless paused.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != SchedulerState::Paused {
            return Err(SchedulerError::invalid_transition(
                self.state,
                SchedulerState::Running,
            ));
        }
        self.transition(SchedulerState::Running)
    }

    /// Stop now. Between ticks every point is a step boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidTransition`] if already stopped.
    pub fn stop(&mut self) -> Result<()> {
        self.transition(SchedulerState::Stopped)?;
        self.clock.clear_backlog();
        Ok(())
    }

    /// Ask for a stop at the next step boundary.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// A handle that can request a stop from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn honor_stop_request(&mut self) -> bool {
        if self.state != SchedulerState::Stopped && self.stop.is_requested() {
            // can_transition_to(Stopped) holds for every other state
            let _ = self.stop();
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Add `elapsed` wall time and run the steps it pays for.
    ///
    /// Does nothing unless running. A drive sample a corner cannot use holds
    /// that corner's stroke and is reported as a violation. Any other corner
    /// error aborts the tick; steps already completed stay committed and a
    /// backlog over `max_frame_time` is still dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidElapsed`] for negative or non-finite
    /// time, or the first corner step error.
    pub fn tick(&mut self, elapsed: f64) -> Result<TickReport> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(SchedulerError::InvalidElapsed(elapsed));
        }
        let mut report = TickReport::default();
        if self.honor_stop_request() {
            report.stopped = true;
            return Ok(report);
        }
        if self.state != SchedulerState::Running {
            return Ok(report);
        }

        self.clock.accumulate(elapsed);
        let budget = self.clock.max_steps_per_tick();
        loop {
            if self.honor_stop_request() {
                report.stopped = true;
                break;
            }
            if report.steps_executed >= budget || !self.clock.step_due() {
                break;
            }
            match self.step() {
                Ok(snapshot) => {
                    report.steps_executed += 1;
                    report.snapshots.push(snapshot);
                }
                Err(err) => {
                    self.discard_overload(report.steps_executed);
                    return Err(err);
                }
            }
        }

        if !report.stopped && report.steps_executed >= budget {
            report.overload = self.discard_overload(report.steps_executed);
        }
        Ok(report)
    }

    fn discard_overload(&mut self, steps_executed: u32) -> Option<OverloadEvent> {
        let discarded_time = self.clock.discard_excess()?;
        warn!(
            steps = steps_executed,
            discarded_time,
            max_frame_time = self.clock.max_frame_time(),
            "Scheduler overloaded; dropping accumulated time"
        );
        Some(OverloadEvent {
            step: self.clock.step_count(),
            steps_executed,
            discarded_time,
        })
    }

    fn step(&mut self) -> Result<StepSnapshot> {
        let mut corrections = Vec::new();
        let mut violations = Vec::new();
        self.apply_pending(&mut corrections, &mut violations);

        let dt = self.clock.dt();
        let time = self.clock.next_time();
        let mut advanced = Vec::with_capacity(self.corners.len());
        for corner in &mut self.corners {
            let drive = corner.drive.sample(time);
            let mut cylinder = corner.cylinder.clone();
            let output = match cylinder.step_drive(dt, drive, &corner.valves) {
                Ok(output) => output,
                Err(err) if is_unusable_drive(&err) => {
                    let held = corner.cylinder.state().stroke;
                    warn!(
                        cylinder = %corner.cylinder.name(),
                        drive = ?drive,
                        held,
                        error = %err,
                        "Drive sample rejected; holding stroke"
                    );
                    let kind = if matches!(err, PneumaticError::NonFiniteInput { .. }) {
                        ConstraintKind::NonFinite
                    } else {
                        ConstraintKind::Kinematic
                    };
                    violations.push(ConstraintViolation::new(
                        kind,
                        format!(
                            "{}: drive {drive:?} rejected ({err}); stroke held",
                            corner.cylinder.name()
                        ),
                    ));
                    cylinder = corner.cylinder.clone();
                    cylinder.step_to_stroke(dt, held, &corner.valves)?
                }
                Err(err) => return Err(err.into()),
            };
            violations.extend(output.violation);
            advanced.push(cylinder);
        }
        for (corner, cylinder) in self.corners.iter_mut().zip(advanced) {
            corner.cylinder = cylinder;
        }
        self.clock.advance();

        let snapshot = StepSnapshot {
            step: self.clock.step_count(),
            time: self.clock.sim_time(),
            cylinders: self.corners.iter().map(|c| c.cylinder.snapshot()).collect(),
            corrections,
            violations,
        };
        self.latest = Some(snapshot.clone());
        Ok(snapshot)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Timing configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Clock.
    #[must_use]
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Shared suspension geometry.
    #[must_use]
    pub const fn geometry(&self) -> &GeometryState {
        &self.geometry
    }

    /// Cylinder by name.
    #[must_use]
    pub fn cylinder(&self, name: &str) -> Option<&PneumaticCylinder> {
        self.corner(name).map(|c| &c.cylinder)
    }

    /// Valve states of a corner.
    #[must_use]
    pub fn valves(&self, name: &str) -> Option<&ValveStates> {
        self.corner(name).map(|c| &c.valves)
    }

    /// Cylinder names in insertion order.
    pub fn cylinder_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.corners.iter().map(|c| c.cylinder.name())
    }

    /// Snapshot of the last completed step.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<&StepSnapshot> {
        self.latest.as_ref()
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PneumaticError::NonFiniteInput { name, value }.into())
    }
}

fn check_drive(cylinder: &PneumaticCylinder, drive: Drive) -> Result<()> {
    match drive {
        Drive::LeverAngle(angle) => {
            check_finite("lever_angle", angle)?;
            if cylinder.has_kinematics() {
                Ok(())
            } else {
                Err(PneumaticError::MissingKinematics {
                    cylinder: cylinder.name().to_string(),
                }
                .into())
            }
        }
        Drive::Stroke(stroke) => check_finite("stroke", stroke),
    }
}

/// Errors caused by the drive sample itself rather than the cylinder state.
fn is_unusable_drive(err: &PneumaticError) -> bool {
    matches!(
        err,
        PneumaticError::NonFiniteInput { .. }
            | PneumaticError::MissingKinematics { .. }
            | PneumaticError::Kinematics(_)
    )
}
