//! Benchmarks for the pneumatic cylinder step.
//!
//! Run with: cargo bench -p sim-pneumatic

#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sim_pneumatic::{Chamber, CylinderSpec, PneumaticCylinder, ValvePort, ValveStates};
use sim_suspension::GeometryState;
use sim_thermo::{GasProperties, GasState, Orifice};

// =============================================================================
// Setup
// =============================================================================

fn corner() -> PneumaticCylinder {
    let geometry = GeometryState::default();
    let tank = GasState::from_pressure(800_000.0, 293.15, 0.005, GasProperties::air()).unwrap();
    PneumaticCylinder::new("corner", CylinderSpec::from_geometry(&geometry))
        .unwrap()
        .with_geometry(&geometry)
        .unwrap()
        .with_reservoir(tank)
        .with_port(ValvePort::supply("fill", Chamber::Head, Orifice::default()))
        .unwrap()
        .with_port(ValvePort::exhaust("vent", Chamber::Rod, Orifice::default()))
        .unwrap()
        .with_port(ValvePort::crossover("bypass", Orifice::from_diameter(0.001, 0.7)))
        .unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("CylinderStep");

    let closed = ValveStates::new();
    let open = ValveStates::new()
        .with("fill", true)
        .with("vent", true)
        .with("bypass", true);

    group.bench_function("lever_valves_closed", |b| {
        let mut cylinder = corner();
        let mut angle = -1.0_f64;
        b.iter(|| {
            angle = if angle > -0.1 { -1.0 } else { angle + 1e-3 };
            black_box(cylinder.step(0.001, black_box(angle), &closed).unwrap())
        });
    });

    group.bench_function("lever_valves_open", |b| {
        let mut cylinder = corner();
        let mut angle = -1.0_f64;
        b.iter(|| {
            angle = if angle > -0.1 { -1.0 } else { angle + 1e-3 };
            black_box(cylinder.step(0.001, black_box(angle), &open).unwrap())
        });
    });

    group.bench_function("stroke_command", |b| {
        let mut cylinder = corner();
        b.iter(|| black_box(cylinder.step_to_stroke(0.001, black_box(0.15), &open).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
