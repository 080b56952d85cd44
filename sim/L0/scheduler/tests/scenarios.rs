//! Scheduler scenarios: overload handling, a four-corner vehicle, geometry
//! edits mid-run and the background worker.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use sim_pneumatic::{Chamber, CylinderSpec, PneumaticCylinder, ValvePort};
use sim_scheduler::{
    SchedulerCommand, SchedulerConfig, SchedulerState, SchedulerWorker, SimulationScheduler,
    SineDrive, WorkerEvent, WorkerRequest,
};
use sim_suspension::{GeometryParameter, GeometryState, GeometryUpdate};
use sim_thermo::{GasProperties, GasState, Orifice};

const CORNERS: [&str; 4] = ["front_left", "front_right", "rear_left", "rear_right"];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn plain_cylinder(name: &str) -> PneumaticCylinder {
    PneumaticCylinder::new(name, CylinderSpec::default()).unwrap()
}

/// A geometry-linked corner with a supply tank and a rod-side vent.
fn vehicle_corner(name: &str) -> PneumaticCylinder {
    let geometry = GeometryState::default();
    let tank = GasState::from_pressure(600_000.0, 293.15, 0.002, GasProperties::air()).unwrap();
    let orifice = Orifice::from_diameter(0.001, 0.72);
    PneumaticCylinder::new(name, CylinderSpec::from_geometry(&geometry))
        .unwrap()
        .with_reservoir(tank)
        .with_port(ValvePort::supply("fill", Chamber::Head, orifice))
        .unwrap()
        .with_port(ValvePort::exhaust("vent", Chamber::Rod, orifice))
        .unwrap()
}

fn vehicle(config: SchedulerConfig) -> SimulationScheduler {
    let mut scheduler = SimulationScheduler::new(config).unwrap();
    for name in CORNERS {
        scheduler.add_linked_corner(vehicle_corner(name)).unwrap();
    }
    scheduler
}

// =============================================================================
// Overload
// =============================================================================

#[test]
fn half_second_stall_runs_budget_and_drops_rest() {
    init_tracing();
    let config = SchedulerConfig::with_timestep(0.001).max_steps_per_tick(10);
    let mut scheduler = SimulationScheduler::new(config).unwrap();
    scheduler.add_corner(plain_cylinder("front_left")).unwrap();
    scheduler.start().unwrap();

    let report = scheduler.tick(0.5).unwrap();
    assert_eq!(report.steps_executed, 10);
    assert_eq!(report.snapshots.len(), 10);
    let overload = report.overload.unwrap();
    assert_relative_eq!(overload.discarded_time, 0.49, epsilon = 1e-9);
    assert_eq!(overload.step, 10);

    // Nothing carried over: the next short tick is on time.
    let report = scheduler.tick(0.005).unwrap();
    assert_eq!(report.steps_executed, 5);
    assert!(report.overload.is_none());
    assert_eq!(scheduler.clock().step_count(), 15);
    assert_relative_eq!(scheduler.clock().discarded_time(), 0.49, epsilon = 1e-9);
}

#[test]
fn offline_config_never_drops_time() {
    let mut scheduler = SimulationScheduler::new(SchedulerConfig::offline()).unwrap();
    scheduler.add_corner(plain_cylinder("front_left")).unwrap();
    scheduler.start().unwrap();

    let report = scheduler.tick(0.5).unwrap();
    assert_eq!(report.steps_executed, 500);
    assert!(report.overload.is_none());
    assert_eq!(scheduler.clock().discarded_time(), 0.0);
}

// =============================================================================
// Vehicle
// =============================================================================

#[test]
fn four_corner_vehicle_with_oscillating_levers() {
    init_tracing();
    let mut scheduler = vehicle(SchedulerConfig::default());
    for (i, name) in CORNERS.into_iter().enumerate() {
        let phase = std::f64::consts::FRAC_PI_2 * f64::from(u8::try_from(i).unwrap());
        let drive = SineDrive::lever(-0.9, 0.4, 2.0).with_phase(phase);
        scheduler
            .submit(SchedulerCommand::set_drive(name, drive))
            .unwrap();
        scheduler
            .submit(SchedulerCommand::set_valve(name, "fill", true))
            .unwrap();
        scheduler
            .submit(SchedulerCommand::set_valve(name, "vent", true))
            .unwrap();
    }
    scheduler.start().unwrap();

    let mut last_step = 0;
    for _ in 0..60 {
        let report = scheduler.tick(1.0 / 60.0).unwrap();
        assert!(report.overload.is_none());
        assert_eq!(report.violations().count(), 0);
        for snap in &report.snapshots {
            assert_eq!(snap.step, last_step + 1);
            last_step = snap.step;
            assert_eq!(snap.cylinders.len(), 4);
            for cyl in &snap.cylinders {
                let bounds = scheduler.cylinder(&cyl.name).unwrap().bounds();
                assert!(bounds.contains(cyl.stroke));
                assert!(cyl.head_pressure > 0.0 && cyl.rod_pressure > 0.0);
                assert!(cyl.net_force.is_finite());
            }
        }
    }

    assert_relative_eq!(scheduler.clock().sim_time(), 1.0, epsilon = 2e-3);
    let snapshot = scheduler.latest_snapshot().unwrap();
    assert_eq!(snapshot.step, scheduler.clock().step_count());

    // Corners driven out of phase sit at different strokes.
    let fl = snapshot.cylinder("front_left").unwrap().stroke;
    let fr = snapshot.cylinder("front_right").unwrap().stroke;
    assert!((fl - fr).abs() > 1e-4);
}

#[test]
fn geometry_edit_mid_run_rebuilds_every_corner() {
    let mut scheduler = vehicle(SchedulerConfig::default());
    scheduler.start().unwrap();
    scheduler.tick(0.01).unwrap();

    scheduler
        .submit(SchedulerCommand::UpdateGeometry(
            GeometryUpdate::new()
                .with(GeometryParameter::Stroke, 0.2)
                .with(GeometryParameter::RodDiameter, 0.9),
        ))
        .unwrap();
    let report = scheduler.tick(0.001).unwrap();
    let snapshot = report.latest().unwrap();

    // The rod diameter is clamped by the bore, the stroke is accepted.
    assert_eq!(snapshot.corrections.len(), 1);
    assert_eq!(
        snapshot.corrections[0].parameter,
        GeometryParameter::RodDiameter
    );
    assert!(scheduler.geometry().report().valid);
    for name in CORNERS {
        let cylinder = scheduler.cylinder(name).unwrap();
        assert_relative_eq!(cylinder.bounds().max, 0.2, epsilon = 1e-12);
        assert_relative_eq!(
            cylinder.spec().dimensions.rod_diameter,
            scheduler.geometry().get(GeometryParameter::RodDiameter),
            epsilon = 1e-12
        );
    }
}

#[test]
fn pause_keeps_state_and_drops_paused_time() {
    let mut scheduler = vehicle(SchedulerConfig::default());
    scheduler.start().unwrap();
    scheduler.tick(0.02).unwrap();
    scheduler.pause().unwrap();

    let before = scheduler.latest_snapshot().cloned().unwrap();
    let report = scheduler.tick(1.0).unwrap();
    assert_eq!(report.steps_executed, 0);
    assert_eq!(scheduler.latest_snapshot().unwrap(), &before);

    scheduler.resume().unwrap();
    let report = scheduler.tick(0.003).unwrap();
    assert_eq!(report.steps_executed, 3);
    assert_eq!(report.latest().unwrap().step, before.step + 3);
}

// =============================================================================
// Worker
// =============================================================================

#[test]
fn worker_runs_vehicle_until_stopped() {
    init_tracing();
    let worker = SchedulerWorker::spawn(vehicle(SchedulerConfig::default()));
    worker
        .submit(SchedulerCommand::set_lever_angle("front_left", -0.5))
        .unwrap();
    worker.send(WorkerRequest::Start).unwrap();
    for _ in 0..5 {
        worker.send(WorkerRequest::Tick(0.01)).unwrap();
    }

    let mut ticks = Vec::new();
    while ticks.len() < 5 {
        match worker.recv().unwrap() {
            WorkerEvent::Tick(report) => ticks.push(report),
            WorkerEvent::Accepted(_) => {}
            WorkerEvent::Error(err) => panic!("unexpected worker error: {err}"),
        }
    }
    assert!(ticks.iter().all(|r| r.steps_executed == 10));
    let stroke = ticks[4]
        .latest()
        .unwrap()
        .cylinder("front_left")
        .unwrap()
        .stroke;
    assert_relative_eq!(stroke, 0.238_54, epsilon = 1e-4);

    worker.request_stop();
    worker.send(WorkerRequest::Tick(0.01)).unwrap();
    let WorkerEvent::Tick(report) = worker.recv().unwrap() else {
        panic!("expected a tick report");
    };
    assert!(report.stopped);
    assert_eq!(report.steps_executed, 0);

    worker.send(WorkerRequest::Start).unwrap();
    assert!(matches!(worker.recv().unwrap(), WorkerEvent::Error(_)));

    let scheduler = worker.shutdown().unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.clock().step_count(), 50);
}
