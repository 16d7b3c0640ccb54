mod controller;
mod event_monitor;
mod handle;

pub(crate) use self::controller::Controller;
pub use self::handle::SimulationHandle;

use crate::basics::Time;
use crate::simulation::Event;

/// Capacity of the channel between the event monitor and the controller.
pub(crate) const CAP_WORK_QUEUE: usize = 128;

/// Message from the event monitor to the controller main loop.
#[derive(Debug)]
pub(crate) enum WorkItem {
    /// An event popped from the shared queue, stamped with the time since
    /// simulation start.
    Event(Event, Time),
    /// The queue was fully drained after shutdown was requested.
    End,
}
