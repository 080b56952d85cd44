//! Fixed-timestep scheduler for pneumatic suspension corners.
//!
//! [`SimulationScheduler`] advances every [`PneumaticCylinder`] at a fixed
//! `dt` regardless of how often the caller ticks it. Wall time accumulates on
//! a [`SimulationClock`]; each tick runs at most `max_steps_per_tick` steps
//! and drops the backlog when it grows past `max_frame_time`, reporting an
//! [`OverloadEvent`] instead of falling further behind.
//!
//! - [`SchedulerConfig`] - Timestep and overload limits
//! - [`SchedulerCommand`] - Geometry, valve and drive changes, applied at the
//!   next step boundary
//! - [`DriveSignal`] - Per-step stroke or lever-angle source
//! - [`StepSnapshot`] / [`TickReport`] - What each step and tick produced
//! - [`SchedulerWorker`] - The scheduler on its own thread, driven over
//!   channels
//!
//! # Example
//!
//! ```
//! use sim_pneumatic::{CylinderSpec, PneumaticCylinder};
//! use sim_scheduler::{SchedulerConfig, SimulationScheduler};
//!
//! let config = SchedulerConfig::with_timestep(0.001).max_steps_per_tick(10);
//! let mut scheduler = SimulationScheduler::new(config)?;
//! scheduler.add_corner(PneumaticCylinder::new("front_left", CylinderSpec::default())?)?;
//! scheduler.start()?;
//!
//! // A half-second stall: 10 steps run, the rest is dropped.
//! let report = scheduler.tick(0.5)?;
//! assert_eq!(report.steps_executed, 10);
//! assert!(report.overload.is_some());
//! # Ok::<(), sim_scheduler::SchedulerError>(())
//! ```
//!
//! [`PneumaticCylinder`]: sim_pneumatic::PneumaticCylinder

#![doc(html_root_url = "https://docs.rs/sim-scheduler/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod clock;
mod command;
mod config;
mod drive;
mod error;
mod scheduler;
mod snapshot;
mod worker;

pub use clock::SimulationClock;
pub use command::SchedulerCommand;
pub use config::SchedulerConfig;
pub use drive::{drive_fn, DriveFn, DriveSignal, HeldDrive, SineDrive};
pub use error::SchedulerError;
pub use scheduler::{SchedulerState, SimulationScheduler, StopHandle};
pub use snapshot::{OverloadEvent, StepSnapshot, TickReport};
pub use worker::{SchedulerWorker, WorkerEvent, WorkerRequest};

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
