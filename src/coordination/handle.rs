use crate::basics::OutputHandler;
use crate::simulation::{Event, EventQueue, Resource, System, SystemStatus};
use std::sync::Arc;
use std::thread::JoinHandle;

/**
Driver-side handle to a running simulation.

The handle is the central object exposed by the API mode. It owns the wired
resources and subsystems while their worker threads run, lets an embedding
driver observe resource levels, flip subsystem statuses and poll the shared
event queue, and tears everything down in an order that guarantees no
further access: statuses are set to `Terminate` first, then every worker is
joined, and only then do the owned structures drop.
*/
#[derive(Debug)]
pub struct SimulationHandle {
    resources: Vec<Arc<Resource>>,
    systems: Vec<Arc<System>>,
    queue: Arc<EventQueue>,
    workers: Vec<JoinHandle<()>>,
    pub(crate) output_handler: Arc<OutputHandler>,
}

impl SimulationHandle {
    pub(crate) fn new(
        resources: Vec<Arc<Resource>>,
        systems: Vec<Arc<System>>,
        queue: Arc<EventQueue>,
        workers: Vec<JoinHandle<()>>,
        output_handler: Arc<OutputHandler>,
    ) -> SimulationHandle {
        SimulationHandle { resources, systems, queue, workers, output_handler }
    }

    pub fn resource(&self, name: &str) -> Option<&Arc<Resource>> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn system(&self, name: &str) -> Option<&Arc<System>> {
        self.systems.iter().find(|s| s.name() == name)
    }

    /// Sets the status of the named subsystem. Returns `false` if no such
    /// subsystem exists. The new status takes effect at the top of the
    /// worker's next iteration.
    pub fn set_status(&self, name: &str, status: SystemStatus) -> bool {
        match self.system(name) {
            Some(system) => {
                system.set_status(status);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the most urgent queued event, if any.
    pub fn poll_event(&self) -> Option<Event> {
        self.queue.pop()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Requests cooperative termination of every worker and blocks until all
    /// of them have exited.
    pub fn shutdown(mut self) {
        for system in &self.systems {
            system.set_status(SystemStatus::Terminate);
        }
        for worker in self.workers.drain(..) {
            worker.join().expect("Could not join on worker thread");
        }
        self.output_handler.terminate();
    }
}
