//! Background scheduler thread.
//!
//! The caller keeps the render loop; the worker owns the
//! [`SimulationScheduler`] and executes requests in the order they arrive.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, info};

use crate::command::SchedulerCommand;
use crate::error::SchedulerError;
use crate::scheduler::{SchedulerState, SimulationScheduler, StopHandle};
use crate::snapshot::TickReport;
use crate::Result;

/// Request sent to the worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Queue a command for the next step boundary.
    Command(SchedulerCommand),
    /// Idle to running.
    Start,
    /// Running to paused.
    Pause,
    /// Paused to running.
    Resume,
    /// Stop now.
    Stop,
    /// Advance by this much wall time (s).
    Tick(f64),
    /// Exit the thread and hand the scheduler back.
    Shutdown,
}

/// Message sent back from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A tick finished.
    Tick(TickReport),
    /// A non-tick request succeeded; carries the resulting state.
    Accepted(SchedulerState),
    /// A request failed.
    Error(SchedulerError),
}

/// Handle to a scheduler running on its own thread.
///
/// # Example
///
/// ```
/// use sim_pneumatic::{CylinderSpec, PneumaticCylinder};
/// use sim_scheduler::{
///     SchedulerConfig, SchedulerWorker, SimulationScheduler, WorkerEvent, WorkerRequest,
/// };
///
/// let mut scheduler = SimulationScheduler::new(SchedulerConfig::default())?;
/// scheduler.add_corner(PneumaticCylinder::new("front_left", CylinderSpec::default())?)?;
///
/// let worker = SchedulerWorker::spawn(scheduler);
/// worker.send(WorkerRequest::Start)?;
/// worker.send(WorkerRequest::Tick(0.01))?;
///
/// let mut steps = 0;
/// while steps == 0 {
///     if let WorkerEvent::Tick(report) = worker.recv()? {
///         steps = report.steps_executed;
///     }
/// }
/// assert_eq!(steps, 10);
///
/// let scheduler = worker.shutdown()?;
/// assert_eq!(scheduler.clock().step_count(), 10);
/// # Ok::<(), sim_scheduler::SchedulerError>(())
/// ```
#[derive(Debug)]
pub struct SchedulerWorker {
    tx: Sender<WorkerRequest>,
    rx: Receiver<WorkerEvent>,
    stop: StopHandle,
    handle: JoinHandle<SimulationScheduler>,
}

impl SchedulerWorker {
    /// Move `scheduler` onto a new thread.
    #[must_use]
    pub fn spawn(mut scheduler: SimulationScheduler) -> Self {
        let (req_tx, req_rx) = crossbeam_channel::unbounded::<WorkerRequest>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();
        let stop = scheduler.stop_handle();

        let handle = thread::spawn(move || {
            info!("Scheduler worker started");
            while let Ok(req) = req_rx.recv() {
                if matches!(req, WorkerRequest::Shutdown) {
                    break;
                }
                let event = handle_request(&mut scheduler, req);
                if event_tx.send(event).is_err() {
                    debug!("Event receiver dropped; worker exiting");
                    break;
                }
            }
            info!(
                steps = scheduler.clock().step_count(),
                state = %scheduler.state(),
                "Scheduler worker finished"
            );
            scheduler
        });

        Self {
            tx: req_tx,
            rx: event_rx,
            stop,
            handle,
        }
    }

    /// Send a request (non-blocking).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::WorkerDisconnected`] if the thread exited.
    pub fn send(&self, req: WorkerRequest) -> Result<()> {
        self.tx
            .send(req)
            .map_err(|_| SchedulerError::WorkerDisconnected)
    }

    /// Queue a command.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::WorkerDisconnected`] if the thread exited.
    pub fn submit(&self, command: SchedulerCommand) -> Result<()> {
        self.send(WorkerRequest::Command(command))
    }

    /// Wait for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::WorkerDisconnected`] if the thread exited.
    pub fn recv(&self) -> Result<WorkerEvent> {
        self.rx
            .recv()
            .map_err(|_| SchedulerError::WorkerDisconnected)
    }

    /// Next event, if one is ready.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::WorkerDisconnected`] if the thread exited and
    /// no events remain.
    pub fn try_recv(&self) -> Result<Option<WorkerEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SchedulerError::WorkerDisconnected),
        }
    }

    /// Stop the scheduler at its next step boundary, even mid-tick.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// Exit the thread and take the scheduler back.
    ///
    /// Requests already sent are handled first.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::WorkerDisconnected`] if the thread panicked.
    pub fn shutdown(self) -> Result<SimulationScheduler> {
        // A closed channel means the thread is already on its way out.
        let _ = self.tx.send(WorkerRequest::Shutdown);
        self.handle
            .join()
            .map_err(|_| SchedulerError::WorkerDisconnected)
    }
}

fn handle_request(scheduler: &mut SimulationScheduler, req: WorkerRequest) -> WorkerEvent {
    let result = match req {
        WorkerRequest::Tick(elapsed) => {
            return match scheduler.tick(elapsed) {
                Ok(report) => WorkerEvent::Tick(report),
                Err(err) => WorkerEvent::Error(err),
            };
        }
        WorkerRequest::Command(command) => scheduler.submit(command),
        WorkerRequest::Start => scheduler.start(),
        WorkerRequest::Pause => scheduler.pause(),
        WorkerRequest::Resume => scheduler.resume(),
        WorkerRequest::Stop => scheduler.stop(),
        WorkerRequest::Shutdown => Ok(()),
    };
    match result {
        Ok(()) => WorkerEvent::Accepted(scheduler.state()),
        Err(err) => WorkerEvent::Error(err),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use sim_pneumatic::{CylinderSpec, PneumaticCylinder};

    fn worker() -> SchedulerWorker {
        let mut scheduler = SimulationScheduler::new(SchedulerConfig::default()).unwrap();
        scheduler
            .add_corner(PneumaticCylinder::new("front_left", CylinderSpec::default()).unwrap())
            .unwrap();
        SchedulerWorker::spawn(scheduler)
    }

    #[test]
    fn test_lifecycle_events() {
        let worker = worker();
        worker.send(WorkerRequest::Start).unwrap();
        assert_eq!(
            worker.recv().unwrap(),
            WorkerEvent::Accepted(SchedulerState::Running)
        );
        worker.send(WorkerRequest::Resume).unwrap();
        assert!(matches!(
            worker.recv().unwrap(),
            WorkerEvent::Error(SchedulerError::InvalidTransition { .. })
        ));
        worker.send(WorkerRequest::Stop).unwrap();
        assert_eq!(
            worker.recv().unwrap(),
            WorkerEvent::Accepted(SchedulerState::Stopped)
        );
        let scheduler = worker.shutdown().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[test]
    fn test_commands_reach_scheduler() {
        let worker = worker();
        worker
            .submit(SchedulerCommand::set_stroke("front_left", 0.05))
            .unwrap();
        worker
            .submit(SchedulerCommand::set_stroke("missing", 0.05))
            .unwrap();
        worker.send(WorkerRequest::Start).unwrap();
        worker.send(WorkerRequest::Tick(0.002)).unwrap();

        let events: Vec<_> = (0..4).map(|_| worker.recv().unwrap()).collect();
        assert!(matches!(
            events[1],
            WorkerEvent::Error(SchedulerError::UnknownCylinder(_))
        ));
        let WorkerEvent::Tick(report) = &events[3] else {
            panic!("expected a tick report, got {:?}", events[3]);
        };
        assert_eq!(report.steps_executed, 2);
        let stroke = report.latest().unwrap().cylinder("front_left").unwrap().stroke;
        assert!((stroke - 0.05).abs() < 1e-12);

        worker.shutdown().unwrap();
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = worker();
        assert!(worker.try_recv().unwrap().is_none());
        worker.shutdown().unwrap();
    }
}
