use super::event_monitor::EventMonitor;
use super::handle::SimulationHandle;
use super::{WorkItem, CAP_WORK_QUEUE};
use crate::basics::{ExecutionMode, OutputHandler, ScenarioSpec, SimConfig};
use crate::simulation::{EventQueue, Resource, ResourceAmount, System, SystemRunner, SystemStatus};
use crossbeam_channel::{bounded, RecvTimeoutError};
use either::Either;
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};

pub(crate) struct Controller {
    scenario: ScenarioSpec,

    config: SimConfig,

    /// Handles all kind of output behavior according to config.
    pub(crate) output_handler: Arc<OutputHandler>,
}

impl Controller {
    pub(crate) fn new(scenario: ScenarioSpec, config: SimConfig) -> Self {
        let output_handler = Arc::new(OutputHandler::new(&config));
        Self { scenario, config, output_handler }
    }

    pub(crate) fn start(self) -> Result<Either<SimulationHandle, Arc<OutputHandler>>, Box<dyn Error>> {
        match self.config.mode {
            ExecutionMode::Run => self.run_bounded().map(|_| Either::Right(self.output_handler)),
            ExecutionMode::API => Ok(Either::Left(self.setup_handle())),
        }
    }

    /// Wires resources and subsystems from the scenario. Resource references
    /// were validated at parse time, so lookups cannot fail here.
    fn instantiate(&self) -> (Vec<Arc<Resource>>, Vec<Arc<System>>, Arc<EventQueue>) {
        let queue = Arc::new(EventQueue::new());

        let mut resources = Vec::with_capacity(self.scenario.resources.len());
        let mut by_name: HashMap<&str, Arc<Resource>> = HashMap::new();
        for spec in &self.scenario.resources {
            let resource = Resource::new(spec.name.clone(), spec.initial_amount, spec.max_capacity);
            by_name.insert(spec.name.as_str(), resource.clone());
            resources.push(resource);
        }

        let binding = |spec: &Option<(String, u64)>| match spec {
            None => ResourceAmount::none(),
            Some((name, amount)) => ResourceAmount::new(by_name[name.as_str()].clone(), *amount),
        };
        let systems = self
            .scenario
            .systems
            .iter()
            .map(|spec| {
                System::new(
                    spec.name.clone(),
                    binding(&spec.consumed),
                    binding(&spec.produced),
                    Duration::from_millis(spec.processing_time_ms),
                    queue.clone(),
                )
            })
            .collect();

        (resources, systems, queue)
    }

    /// Spawns one worker thread per subsystem, named after it.
    fn spawn_workers(&self, systems: &[Arc<System>]) -> Vec<JoinHandle<()>> {
        systems
            .iter()
            .map(|system| {
                let runner = SystemRunner::new(system.clone(), self.config.base_wait);
                thread::Builder::new()
                    .name(system.name().into())
                    .spawn(move || runner.run())
                    .unwrap_or_else(|e| unreachable!("Failed to start worker thread: {}", e))
            })
            .collect()
    }

    fn setup_handle(&self) -> SimulationHandle {
        let (resources, systems, queue) = self.instantiate();
        let workers = self.spawn_workers(&systems);
        SimulationHandle::new(resources, systems, queue, workers, self.output_handler.clone())
    }

    /// Runs the simulation for the configured duration: spawns the workers
    /// and the event monitor, logs observed events, then coordinates the
    /// shutdown.
    fn run_bounded(&self) -> Result<(), Box<dyn Error>> {
        let (resources, systems, queue) = self.instantiate();

        let start_time = Instant::now();
        let mut start_time_ref = self.output_handler.start_time.lock().unwrap();
        *start_time_ref = SystemTime::now();
        drop(start_time_ref);

        let workers = self.spawn_workers(&systems);

        let shutdown = Arc::new(AtomicBool::new(false));
        let (work_tx, work_rx) = bounded(CAP_WORK_QUEUE);
        let copy_output_handler = self.output_handler.clone();
        let monitor =
            EventMonitor::new(queue, copy_output_handler, shutdown.clone(), self.config.base_wait, start_time);
        let monitor_thread = thread::Builder::new()
            .name("EventMonitor".into())
            .spawn(move || monitor.start(work_tx))
            .unwrap_or_else(|e| unreachable!("Failed to start EventMonitor thread: {}", e));

        // Observe events until the deadline passes.
        let deadline = start_time + self.config.duration;
        loop {
            match work_rx.recv_deadline(deadline) {
                Ok(WorkItem::Event(event, time)) => self.output_handler.event(&event, time),
                Ok(WorkItem::End) => unreachable!("Monitor stopped before shutdown was requested."),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => panic!("Event monitor hung up!"),
            }
        }

        // Request cooperative termination; workers observe it at the top of
        // their next iteration.
        for system in &systems {
            system.set_status(SystemStatus::Terminate);
        }
        for worker in workers {
            worker.join().expect("Could not join on worker thread");
        }

        // Nothing can push anymore; let the monitor drain the rest.
        shutdown.store(true, Ordering::Release);
        loop {
            match work_rx.recv() {
                Ok(WorkItem::Event(event, time)) => self.output_handler.event(&event, time),
                Ok(WorkItem::End) => break,
                Err(e) => panic!("Event monitor hung up! {}", e),
            }
        }
        monitor_thread.join().expect("Could not join on EventMonitor thread");

        for resource in &resources {
            self.output_handler.debug(|| {
                format!("Final amount of `{}`: {}/{}", resource.name(), resource.amount(), resource.max_capacity())
            });
        }
        self.output_handler.terminate();
        Ok(())
    }
}
