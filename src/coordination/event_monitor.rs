use super::WorkItem;
use crate::basics::OutputHandler;
use crate::simulation::EventQueue;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Drains the shared event queue and forwards every event to the controller.
///
/// An empty queue is a normal condition: the monitor sleeps one poll interval
/// and tries again. Once the shutdown flag is set (after every worker has
/// been joined, so nothing can push anymore) the monitor drains what is left
/// and announces the end of the stream.
pub(crate) struct EventMonitor {
    queue: Arc<EventQueue>,
    handler: Arc<OutputHandler>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
    start_time: Instant,
}

impl EventMonitor {
    pub(crate) fn new(
        queue: Arc<EventQueue>,
        handler: Arc<OutputHandler>,
        shutdown: Arc<AtomicBool>,
        poll_interval: Duration,
        start_time: Instant,
    ) -> EventMonitor {
        EventMonitor { queue, handler, shutdown, poll_interval, start_time }
    }

    pub(crate) fn start(self, work_queue: Sender<WorkItem>) {
        loop {
            while let Some(event) = self.queue.pop() {
                let time = self.start_time.elapsed();
                if work_queue.send(WorkItem::Event(event, time)).is_err() {
                    self.handler.runtime_warning(|| "Monitor: controller hung up; remaining events are lost.");
                    return;
                }
            }
            if self.shutdown.load(Ordering::Acquire) {
                let _ = work_queue.send(WorkItem::End); // Whether it fails or not, we really don't care.
                return;
            }
            thread::sleep(self.poll_interval);
        }
    }
}
