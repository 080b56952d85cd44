//! Double-acting pneumatic cylinder.
//!
//! # Step
//!
//! Each [`PneumaticCylinder::step`] runs four stages:
//!
//! 1. **Stroke** - lever angle to stroke through the [`KinematicsProvider`],
//!    clamped into the stroke bounds. Clamping is logged and reported as a
//!    [`ConstraintViolation`].
//! 2. **Volumes** - chamber volumes from stroke and piston areas, floored at
//!    [`VOLUME_EPSILON`].
//! 3. **Mass flow** - every open port's flow is evaluated from the
//!    start-of-step states, limited so no source gives more than it holds,
//!    then applied: withdrawals first, then inflow mixed at the mass-weighted
//!    inflow temperature, then the volume change.
//! 4. **Force** - `p_head * A_head - p_rod * A_rod - friction(v)`.
//!
//! The whole step is computed on copies of the chamber states and committed
//! at the end, so an error leaves the cylinder exactly as it was.
//!
//! A chamber whose cross-section is below [`AREA_EPSILON`] is rigid: it
//! exchanges no mass and keeps its volume.

use std::sync::Arc;

use sim_suspension::{
    ChamberAreas, ChamberPair, ConstraintKind, ConstraintViolation, GeometryState,
    KinematicsProvider, StrokeBounds, AREA_EPSILON,
};
use sim_thermo::{FlowConditions, FlowDirection, GasState, ValveFlowModel, MIN_GAS_MASS};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PneumaticError;
use crate::friction::FrictionModel;
use crate::port::{Chamber, PortTarget, ValvePort, ValveStates};
use crate::spec::{AmbientConditions, CylinderSpec};
use crate::Result;

/// Chamber volumes never drop below this (m³).
pub const VOLUME_EPSILON: f64 = 1e-9;

// ============================================================================
// Public state types
// ============================================================================

/// How a step's stroke is commanded.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Drive {
    /// Lever angle (rad), converted through the kinematics provider.
    LeverAngle(f64),
    /// Stroke (m), applied directly.
    Stroke(f64),
}

/// Kinematic and chamber state after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CylinderState {
    /// Piston stroke (m).
    pub stroke: f64,
    /// Lower stroke bound (m).
    pub stroke_min: f64,
    /// Upper stroke bound (m).
    pub stroke_max: f64,
    /// Head chamber volume (m³).
    pub head_volume: f64,
    /// Rod chamber volume (m³).
    pub rod_volume: f64,
    /// Stroke rate over the last step (m/s).
    pub stroke_velocity: f64,
    /// Head chamber pressure (Pa).
    pub head_pressure: f64,
    /// Rod chamber pressure (Pa).
    pub rod_pressure: f64,
}

/// Display-facing summary of one cylinder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CylinderSnapshot {
    /// Cylinder name.
    pub name: String,
    /// Piston stroke (m).
    pub stroke: f64,
    /// Head chamber pressure (Pa).
    pub head_pressure: f64,
    /// Rod chamber pressure (Pa).
    pub rod_pressure: f64,
    /// Net rod force (N), positive extends.
    pub net_force: f64,
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// State after the step.
    pub state: CylinderState,
    /// Net rod force (N), positive extends.
    pub net_force: f64,
    /// Set when the commanded stroke had to be clamped.
    pub violation: Option<ConstraintViolation>,
}

// ============================================================================
// Mass transfer bookkeeping
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Head,
    Rod,
    Reservoir,
    Atmosphere,
}

impl Node {
    const fn index(self) -> Option<usize> {
        match self {
            Self::Head => Some(0),
            Self::Rod => Some(1),
            Self::Reservoir => Some(2),
            Self::Atmosphere => None,
        }
    }
}

impl From<Chamber> for Node {
    fn from(chamber: Chamber) -> Self {
        match chamber {
            Chamber::Head => Self::Head,
            Chamber::Rod => Self::Rod,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transfer {
    from: Node,
    to: Node,
    mass: f64,
    temperature: f64,
}

/// Per-node totals for one step: `[head, rod, reservoir]`.
#[derive(Debug, Default)]
struct Exchange {
    outflow: [f64; 3],
    inflow: [f64; 3],
    inflow_heat: [f64; 3],
}

impl Exchange {
    fn from_transfers(transfers: &[Transfer]) -> Self {
        let mut exchange = Self::default();
        for t in transfers {
            if let Some(i) = t.from.index() {
                exchange.outflow[i] += t.mass;
            }
            if let Some(i) = t.to.index() {
                exchange.inflow[i] += t.mass;
                exchange.inflow_heat[i] += t.mass * t.temperature;
            }
        }
        exchange
    }

    fn apply(&self, node: Node, gas: &mut GasState) -> Result<()> {
        let Some(i) = node.index() else {
            return Ok(());
        };
        if self.outflow[i] > 0.0 {
            gas.remove_mass(self.outflow[i])?;
        }
        if self.inflow[i] > 0.0 {
            gas.add_mass(self.inflow[i], self.inflow_heat[i] / self.inflow[i])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct InitialCharge {
    stroke: Option<f64>,
    reservoir: Option<GasState>,
}

// ============================================================================
// PneumaticCylinder
// ============================================================================

/// A double-acting cylinder with two gas chambers and named valve ports.
///
/// The cylinder exclusively owns its chamber gas states (and its reservoir,
/// if any); they change only through [`PneumaticCylinder::step`].
///
/// # Example
///
/// ```
/// use sim_pneumatic::{Chamber, CylinderSpec, PneumaticCylinder, ValvePort, ValveStates};
/// use sim_thermo::Orifice;
///
/// let mut cylinder = PneumaticCylinder::new("front_left", CylinderSpec::default())?
///     .with_port(ValvePort::exhaust("vent", Chamber::Head, Orifice::default()))?;
///
/// let valves = ValveStates::new().with("vent", true);
/// let out = cylinder.step_to_stroke(0.001, 0.15, &valves)?;
/// assert!(out.state.head_pressure < 300_000.0);
/// # Ok::<(), sim_pneumatic::PneumaticError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PneumaticCylinder {
    name: String,
    spec: CylinderSpec,
    kinematics: Option<Arc<dyn KinematicsProvider>>,
    bounds: StrokeBounds,
    areas: ChamberAreas,
    head: GasState,
    rod: GasState,
    reservoir: Option<GasState>,
    ports: Vec<ValvePort>,
    ambient: AmbientConditions,
    friction: FrictionModel,
    flow_model: ValveFlowModel,
    stroke: f64,
    velocity: f64,
    net_force: f64,
    initial: InitialCharge,
}

impl PneumaticCylinder {
    /// Build a cylinder and charge both chambers.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::Kinematics`] wrapping
    /// `DegenerateGeometry` for an unbuildable cylinder, or any other
    /// validation error from [`CylinderSpec::validate`].
    pub fn new(name: impl Into<String>, spec: CylinderSpec) -> Result<Self> {
        spec.validate()?;
        let bounds = spec.dimensions.bounds()?;
        let areas = spec.dimensions.areas();
        let stroke = initial_stroke(&spec, bounds);
        let volumes = floor_volumes(spec.dimensions.chamber_volumes(stroke));

        let head = charge(&spec, volumes.head)?;
        let rod = charge(&spec, volumes.rod)?;

        Ok(Self {
            name: name.into(),
            spec,
            kinematics: None,
            bounds,
            areas,
            head,
            rod,
            reservoir: None,
            ports: Vec::new(),
            ambient: AmbientConditions::default(),
            friction: FrictionModel::default(),
            flow_model: ValveFlowModel::try_new(spec.gas)?
                .with_direction(FlowDirection::Bidirectional),
            stroke,
            velocity: 0.0,
            net_force: 0.0,
            initial: InitialCharge {
                stroke: spec.initial_stroke,
                reservoir: None,
            },
        })
    }

    /// Drive the stroke from lever angle through `provider`.
    #[must_use]
    pub fn with_kinematics(mut self, provider: impl KinematicsProvider + 'static) -> Self {
        self.kinematics = Some(Arc::new(provider));
        self
    }

    /// Adopt a suspension geometry. See [`PneumaticCylinder::apply_geometry`].
    ///
    /// # Errors
    ///
    /// Propagates errors from [`PneumaticCylinder::apply_geometry`].
    pub fn with_geometry(mut self, geometry: &GeometryState) -> Result<Self> {
        self.apply_geometry(geometry)?;
        Ok(self)
    }

    /// Attach a supply reservoir.
    #[must_use]
    pub fn with_reservoir(mut self, reservoir: GasState) -> Self {
        self.initial.reservoir = Some(reservoir.clone());
        self.reservoir = Some(reservoir);
        self
    }

    /// Add a valve port.
    ///
    /// # Errors
    ///
    /// See [`PneumaticCylinder::add_port`].
    pub fn with_port(mut self, port: ValvePort) -> Result<Self> {
        self.add_port(port)?;
        Ok(self)
    }

    /// Set the ambient conditions exhaust ports vent to.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidConfig`] for non-positive values.
    pub fn with_ambient(mut self, ambient: AmbientConditions) -> Result<Self> {
        ambient.validate()?;
        self.ambient = ambient;
        Ok(self)
    }

    /// Set the seal friction.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidConfig`] for invalid coefficients.
    pub fn with_friction(mut self, friction: FrictionModel) -> Result<Self> {
        friction.validate()?;
        self.friction = friction;
        Ok(self)
    }

    /// Add a valve port.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidPort`] for a duplicate name, a port
    /// that connects a chamber to itself, a reservoir port without a
    /// reservoir, or an invalid orifice.
    pub fn add_port(&mut self, port: ValvePort) -> Result<()> {
        let reject = |reason| PneumaticError::InvalidPort {
            port: port.name.clone(),
            reason,
        };
        if self.ports.iter().any(|p| p.name == port.name) {
            return Err(reject("duplicate port name"));
        }
        if port.target == PortTarget::Chamber(port.chamber) {
            return Err(reject("port connects a chamber to itself"));
        }
        if port.target == PortTarget::Reservoir && self.reservoir.is_none() {
            return Err(reject("no reservoir attached"));
        }
        let area = port.orifice.effective_area();
        if !area.is_finite() || area < 0.0 {
            return Err(reject("orifice area must be non-negative"));
        }
        self.ports.push(port);
        Ok(())
    }

    /// Rebuild bounds, areas and kinematics from a suspension geometry.
    ///
    /// Stroke travel becomes the geometry's effective stroke range and the
    /// chambers are resized around the current stroke. Call only between
    /// steps. The cylinder is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::Kinematics`] for an unbuildable cylinder.
    pub fn apply_geometry(&mut self, geometry: &GeometryState) -> Result<()> {
        let kinematics = geometry.kinematics()?;
        let bounds = geometry.effective_stroke_range()?;
        let dimensions = geometry.cylinder();
        let areas = dimensions.areas();
        let stroke = bounds.clamp(self.stroke);
        let volumes = floor_volumes(dimensions.chamber_volumes(stroke));

        let mut head = self.head.clone();
        let mut rod = self.rod.clone();
        head.update_volume(volumes.head, self.spec.process)?;
        rod.update_volume(volumes.rod, self.spec.process)?;

        self.spec.dimensions = dimensions;
        self.kinematics = Some(Arc::new(kinematics));
        self.bounds = bounds;
        self.areas = areas;
        self.head = head;
        self.rod = rod;
        self.stroke = stroke;
        self.velocity = 0.0;

        debug!(
            cylinder = %self.name,
            stroke_min = bounds.min,
            stroke_max = bounds.max,
            "Cylinder geometry applied"
        );
        Ok(())
    }

    /// Restore the initial charge and stroke with the current dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the chambers cannot be recharged.
    pub fn reset(&mut self) -> Result<()> {
        let stroke = self
            .bounds
            .clamp(self.initial.stroke.unwrap_or_else(|| midpoint(self.bounds)));
        let volumes = floor_volumes(self.spec.dimensions.chamber_volumes(stroke));
        self.head = charge(&self.spec, volumes.head)?;
        self.rod = charge(&self.spec, volumes.rod)?;
        self.reservoir.clone_from(&self.initial.reservoir);
        self.stroke = stroke;
        self.velocity = 0.0;
        self.net_force = 0.0;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Advance one step with the stroke set by a lever angle.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidTimestep`] for a non-positive `dt`,
    /// [`PneumaticError::NonFiniteInput`] for a NaN or infinite angle, and
    /// [`PneumaticError::MissingKinematics`] when no provider is attached.
    pub fn step(
        &mut self,
        dt: f64,
        lever_angle: f64,
        valve_states: &ValveStates,
    ) -> Result<StepOutput> {
        check_timestep(dt)?;
        if !lever_angle.is_finite() {
            return Err(PneumaticError::NonFiniteInput {
                name: "lever_angle",
                value: lever_angle,
            });
        }
        let provider = self
            .kinematics
            .as_ref()
            .ok_or_else(|| PneumaticError::MissingKinematics {
                cylinder: self.name.clone(),
            })?;
        let requested = provider.stroke_at_angle(lever_angle)?;
        self.advance(dt, requested, valve_states)
    }

    /// Advance one step with a directly commanded stroke.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::InvalidTimestep`] for a non-positive `dt` and
    /// [`PneumaticError::NonFiniteInput`] for a NaN or infinite command.
    pub fn step_to_stroke(
        &mut self,
        dt: f64,
        stroke_command: f64,
        valve_states: &ValveStates,
    ) -> Result<StepOutput> {
        check_timestep(dt)?;
        if !stroke_command.is_finite() {
            return Err(PneumaticError::NonFiniteInput {
                name: "stroke_command",
                value: stroke_command,
            });
        }
        self.advance(dt, stroke_command, valve_states)
    }

    /// Advance one step with either kind of drive.
    ///
    /// # Errors
    ///
    /// See [`PneumaticCylinder::step`] and [`PneumaticCylinder::step_to_stroke`].
    pub fn step_drive(
        &mut self,
        dt: f64,
        drive: Drive,
        valve_states: &ValveStates,
    ) -> Result<StepOutput> {
        match drive {
            Drive::LeverAngle(angle) => self.step(dt, angle, valve_states),
            Drive::Stroke(stroke) => self.step_to_stroke(dt, stroke, valve_states),
        }
    }

    fn advance(&mut self, dt: f64, requested: f64, valves: &ValveStates) -> Result<StepOutput> {
        // 1. Stroke
        let stroke = self.bounds.clamp(requested);
        #[allow(clippy::float_cmp)]
        let violation = if stroke == requested {
            None
        } else {
            warn!(
                cylinder = %self.name,
                requested,
                applied = stroke,
                min = self.bounds.min,
                max = self.bounds.max,
                "Stroke clamped to cylinder bounds"
            );
            Some(ConstraintViolation::new(
                ConstraintKind::Cylindrical,
                format!(
                    "{}: stroke {requested:.4} m clamped to {stroke:.4} m",
                    self.name
                ),
            ))
        };

        // 2. Volumes
        let volumes = floor_volumes(self.spec.dimensions.chamber_volumes(stroke));

        // 3. Mass flow from start-of-step states, then volume change
        let transfers = self.limit_to_available(self.collect_transfers(dt, valves));
        let exchange = Exchange::from_transfers(&transfers);

        let mut head = self.head.clone();
        let mut rod = self.rod.clone();
        let mut reservoir = self.reservoir.clone();
        exchange.apply(Node::Head, &mut head)?;
        exchange.apply(Node::Rod, &mut rod)?;
        if let Some(tank) = reservoir.as_mut() {
            exchange.apply(Node::Reservoir, tank)?;
        }
        if !self.is_rigid(Chamber::Head) {
            head.update_volume(volumes.head, self.spec.process)?;
        }
        if !self.is_rigid(Chamber::Rod) {
            rod.update_volume(volumes.rod, self.spec.process)?;
        }

        // 4. Force
        let velocity = (stroke - self.stroke) / dt;
        let pressure_force =
            head.pressure() * self.areas.head - rod.pressure() * self.areas.rod;
        let net_force = pressure_force - self.friction.force(velocity, pressure_force);

        self.head = head;
        self.rod = rod;
        self.reservoir = reservoir;
        self.stroke = stroke;
        self.velocity = velocity;
        self.net_force = net_force;

        Ok(StepOutput {
            state: self.state(),
            net_force,
            violation,
        })
    }

    fn collect_transfers(&self, dt: f64, valves: &ValveStates) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        for port in &self.ports {
            if !valves.is_open(&port.name) || self.is_rigid(port.chamber) {
                continue;
            }
            let (target, far): (Node, FlowConditions) = match port.target {
                PortTarget::Atmosphere => (Node::Atmosphere, self.ambient.conditions()),
                PortTarget::Reservoir => match &self.reservoir {
                    Some(tank) => (Node::Reservoir, tank.conditions()),
                    None => continue,
                },
                PortTarget::Chamber(other) => {
                    if self.is_rigid(other) {
                        continue;
                    }
                    (Node::from(other), self.gas(other).conditions())
                }
            };
            let near = self.gas(port.chamber).conditions();

            // Positive: target into chamber
            let rate = port
                .direction
                .restrict(self.flow_model.flow_between(far, near, &port.orifice, true));
            let mass = rate * dt;
            let chamber = Node::from(port.chamber);
            if mass > 0.0 {
                transfers.push(Transfer {
                    from: target,
                    to: chamber,
                    mass,
                    temperature: far.temperature,
                });
            } else if mass < 0.0 {
                transfers.push(Transfer {
                    from: chamber,
                    to: target,
                    mass: -mass,
                    temperature: near.temperature,
                });
            }
        }
        transfers
    }

    /// Scale each source's transfers so it never gives more than it holds.
    fn limit_to_available(&self, mut transfers: Vec<Transfer>) -> Vec<Transfer> {
        let requested = Exchange::from_transfers(&transfers).outflow;
        let available = [
            self.head.mass(),
            self.rod.mass(),
            self.reservoir.as_ref().map_or(0.0, GasState::mass),
        ]
        .map(|m| (m - MIN_GAS_MASS).max(0.0));

        for t in &mut transfers {
            if let Some(i) = t.from.index() {
                if requested[i] > available[i] {
                    t.mass *= available[i] / requested[i];
                }
            }
        }
        transfers
    }

    fn is_rigid(&self, chamber: Chamber) -> bool {
        let area = match chamber {
            Chamber::Head => self.areas.head,
            Chamber::Rod => self.areas.rod,
        };
        area < AREA_EPSILON
    }

    fn gas(&self, chamber: Chamber) -> &GasState {
        match chamber {
            Chamber::Head => &self.head,
            Chamber::Rod => &self.rod,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Cylinder name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current configuration.
    #[must_use]
    pub const fn spec(&self) -> &CylinderSpec {
        &self.spec
    }

    /// Current stroke travel.
    #[must_use]
    pub const fn bounds(&self) -> StrokeBounds {
        self.bounds
    }

    /// Piston areas.
    #[must_use]
    pub const fn areas(&self) -> ChamberAreas {
        self.areas
    }

    /// Head chamber gas.
    #[must_use]
    pub const fn head(&self) -> &GasState {
        &self.head
    }

    /// Rod chamber gas.
    #[must_use]
    pub const fn rod(&self) -> &GasState {
        &self.rod
    }

    /// Whether lever-angle drive is available.
    #[must_use]
    pub fn has_kinematics(&self) -> bool {
        self.kinematics.is_some()
    }

    /// Supply reservoir gas, if attached.
    #[must_use]
    pub fn reservoir(&self) -> Option<&GasState> {
        self.reservoir.as_ref()
    }

    /// Valve ports.
    #[must_use]
    pub fn ports(&self) -> &[ValvePort] {
        &self.ports
    }

    /// Check that a port exists.
    ///
    /// # Errors
    ///
    /// Returns [`PneumaticError::UnknownPort`] if it does not.
    pub fn check_port(&self, name: &str) -> Result<()> {
        if self.ports.iter().any(|p| p.name == name) {
            Ok(())
        } else {
            Err(PneumaticError::unknown_port(&self.name, name))
        }
    }

    /// Net rod force from the last step (N).
    #[must_use]
    pub const fn net_force(&self) -> f64 {
        self.net_force
    }

    /// Gas mass in both chambers and the reservoir (kg).
    #[must_use]
    pub fn contained_mass(&self) -> f64 {
        self.head.mass()
            + self.rod.mass()
            + self.reservoir.as_ref().map_or(0.0, GasState::mass)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CylinderState {
        CylinderState {
            stroke: self.stroke,
            stroke_min: self.bounds.min,
            stroke_max: self.bounds.max,
            head_volume: self.head.volume(),
            rod_volume: self.rod.volume(),
            stroke_velocity: self.velocity,
            head_pressure: self.head.pressure(),
            rod_pressure: self.rod.pressure(),
        }
    }

    /// Display summary.
    #[must_use]
    pub fn snapshot(&self) -> CylinderSnapshot {
        CylinderSnapshot {
            name: self.name.clone(),
            stroke: self.stroke,
            head_pressure: self.head.pressure(),
            rod_pressure: self.rod.pressure(),
            net_force: self.net_force,
        }
    }
}

fn check_timestep(dt: f64) -> Result<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(PneumaticError::InvalidTimestep(dt))
    }
}

fn midpoint(bounds: StrokeBounds) -> f64 {
    (bounds.min + bounds.max) / 2.0
}

fn initial_stroke(spec: &CylinderSpec, bounds: StrokeBounds) -> f64 {
    bounds.clamp(spec.initial_stroke.unwrap_or_else(|| midpoint(bounds)))
}

fn floor_volumes(volumes: ChamberPair) -> ChamberPair {
    ChamberPair {
        head: volumes.head.max(VOLUME_EPSILON),
        rod: volumes.rod.max(VOLUME_EPSILON),
    }
}

fn charge(spec: &CylinderSpec, volume: f64) -> Result<GasState> {
    Ok(GasState::from_pressure(
        spec.precharge_pressure,
        spec.precharge_temperature,
        volume,
        spec.gas,
    )?)
}
