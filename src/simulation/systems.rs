use crate::basics::BACKOFF_FACTOR;
use crate::simulation::{Event, EventQueue, OperationOutcome, Priority, Resource, ResourceAmount};
use spin_sleep::SpinSleeper;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Operating mode of a subsystem, set by a controller and read by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    Normal,
    /// Doubles the processing time.
    Slow,
    /// Halves the processing time.
    Fast,
    /// Tells the worker to exit at the top of its next iteration.
    Terminate,
}

/// An autonomous subsystem that converts one resource into another over
/// simulated time.
///
/// The struct carries the immutable configuration plus the externally
/// settable status; the per-iteration state lives in the [`SystemRunner`]
/// driving the worker thread.
#[derive(Debug)]
pub struct System {
    name: String,
    consumed: ResourceAmount,
    produced: ResourceAmount,
    processing_time: Duration,
    status: Mutex<SystemStatus>,
    event_queue: Arc<EventQueue>,
}

impl System {
    pub fn new<S: Into<String>>(
        name: S,
        consumed: ResourceAmount,
        produced: ResourceAmount,
        processing_time: Duration,
        event_queue: Arc<EventQueue>,
    ) -> Arc<System> {
        Arc::new(System {
            name: name.into(),
            consumed,
            produced,
            processing_time,
            status: Mutex::new(SystemStatus::Normal),
            event_queue,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn consumed(&self) -> &ResourceAmount {
        &self.consumed
    }

    pub fn produced(&self) -> &ResourceAmount {
        &self.produced
    }

    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }

    pub fn status(&self) -> SystemStatus {
        *self.status.lock().unwrap()
    }

    pub fn set_status(&self, status: SystemStatus) {
        *self.status.lock().unwrap() = status;
    }
}

/// Drives a [`System`] through its convert/store loop on a worker thread.
///
/// The pending-to-store buffer is confined to the runner; no other thread
/// ever touches it.
#[allow(missing_debug_implementations)]
pub struct SystemRunner {
    system: Arc<System>,
    amount_stored: u64,
    base_wait: Duration,
    sleeper: SpinSleeper,
}

impl SystemRunner {
    pub fn new(system: Arc<System>, base_wait: Duration) -> SystemRunner {
        SystemRunner { system, amount_stored: 0, base_wait, sleeper: SpinSleeper::new(1_000_000) }
    }

    /// Units produced but not yet deposited.
    pub fn amount_stored(&self) -> u64 {
        self.amount_stored
    }

    /// Runs until the status is set to `Terminate`. Termination takes effect
    /// only between iterations, never mid-sleep.
    pub fn run(mut self) {
        loop {
            if self.system.status() == SystemStatus::Terminate {
                return;
            }
            self.cycle();
        }
    }

    /// One iteration of the state machine: convert when nothing is pending,
    /// store otherwise, then pace the loop. Every non-ok outcome is reported
    /// to the shared event queue followed by a backoff pause.
    pub fn cycle(&mut self) {
        if self.amount_stored == 0 {
            let outcome = self.convert();
            if outcome != OperationOutcome::Ok {
                self.report(outcome, Priority::High, self.system.consumed.resource.clone());
                self.back_off();
            }
        }
        if self.amount_stored > 0 {
            let outcome = self.store();
            if outcome != OperationOutcome::Ok {
                self.report(outcome, Priority::Low, self.system.produced.resource.clone());
                self.back_off();
            }
        }
        thread::sleep(self.base_wait);
    }

    /// Attempts to consume the bound resource and, on success, simulates the
    /// processing delay and fills the pending-to-store buffer.
    ///
    /// Without a consumed resource the conversion trivially succeeds.
    pub fn convert(&mut self) -> OperationOutcome {
        let outcome = match &self.system.consumed.resource {
            None => OperationOutcome::Ok,
            Some(resource) => resource.withdraw(self.system.consumed.amount),
        };

        if outcome == OperationOutcome::Ok {
            self.simulate_processing();
            self.amount_stored =
                if self.system.produced.resource.is_some() { self.system.produced.amount } else { 0 };
        }

        outcome
    }

    /// Attempts to deposit the pending units into the produced resource.
    ///
    /// Whatever does not fit below the capacity is retained and retried on a
    /// later iteration; a nonzero remainder signals `Capacity`.
    pub fn store(&mut self) -> OperationOutcome {
        let resource = match &self.system.produced.resource {
            None => {
                // Nothing to store into; the pending units evaporate.
                self.amount_stored = 0;
                return OperationOutcome::Ok;
            }
            Some(resource) => resource,
        };

        self.amount_stored = resource.deposit(self.amount_stored);
        if self.amount_stored != 0 {
            OperationOutcome::Capacity
        } else {
            OperationOutcome::Ok
        }
    }

    /// Sleeps for the processing time adjusted by the current status.
    fn simulate_processing(&self) {
        let processing_time = match self.system.status() {
            SystemStatus::Slow => self.system.processing_time * 2,
            SystemStatus::Fast => self.system.processing_time / 2,
            _ => self.system.processing_time,
        };
        self.sleeper.sleep(processing_time);
    }

    /// Builds an event carrying the resource's current amount and pushes it
    /// to the shared queue. The amount is read under the resource's own lock
    /// at build time.
    fn report(&self, outcome: OperationOutcome, priority: Priority, resource: Option<Arc<Resource>>) {
        let amount = resource.as_ref().map(|r| r.amount()).unwrap_or(0);
        let event = Event::new(self.system.name.clone(), resource, outcome, priority, amount);
        self.system.event_queue.push(event);
    }

    /// Pause after a failed convert/store so the loop does not spam the
    /// queue with identical failure events.
    fn back_off(&self) {
        thread::sleep(self.base_wait * BACKOFF_FACTOR);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    const NO_WAIT: Duration = Duration::from_millis(0);

    fn engine(
        fuel: &Arc<Resource>,
        thrust: &Arc<Resource>,
        queue: &Arc<EventQueue>,
    ) -> SystemRunner {
        let system = System::new(
            "engine",
            ResourceAmount::new(fuel.clone(), 10),
            ResourceAmount::new(thrust.clone(), 5),
            Duration::from_millis(1),
            queue.clone(),
        );
        SystemRunner::new(system, NO_WAIT)
    }

    #[test]
    fn conversion_conserves_units() {
        let fuel = Resource::new("fuel", 10, 100);
        let thrust = Resource::new("thrust", 0, 50);
        let queue = Arc::new(EventQueue::new());
        let mut runner = engine(&fuel, &thrust, &queue);

        assert_eq!(runner.convert(), OperationOutcome::Ok);
        assert_eq!(fuel.amount(), 0);
        assert_eq!(runner.amount_stored(), 5);

        assert_eq!(runner.store(), OperationOutcome::Ok);
        assert_eq!(thrust.amount(), 5);
        assert_eq!(runner.amount_stored(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn convert_distinguishes_empty_from_insufficient() {
        let fuel = Resource::new("fuel", 7, 100);
        let thrust = Resource::new("thrust", 0, 50);
        let queue = Arc::new(EventQueue::new());
        let mut runner = engine(&fuel, &thrust, &queue);

        assert_eq!(runner.convert(), OperationOutcome::Insufficient);
        assert_eq!(fuel.amount(), 7);
        fuel.withdraw(7);
        assert_eq!(runner.convert(), OperationOutcome::Empty);
    }

    #[test]
    fn convert_without_consumed_resource_succeeds() {
        let thrust = Resource::new("thrust", 0, 50);
        let queue = Arc::new(EventQueue::new());
        let system = System::new(
            "generator",
            ResourceAmount::none(),
            ResourceAmount::new(thrust.clone(), 3),
            Duration::from_millis(1),
            queue,
        );
        let mut runner = SystemRunner::new(system, NO_WAIT);

        assert_eq!(runner.convert(), OperationOutcome::Ok);
        assert_eq!(runner.amount_stored(), 3);
    }

    #[test]
    fn store_without_produced_resource_discards() {
        let fuel = Resource::new("fuel", 20, 100);
        let queue = Arc::new(EventQueue::new());
        let system = System::new(
            "vent",
            ResourceAmount::new(fuel, 10),
            ResourceAmount::none(),
            Duration::from_millis(1),
            queue,
        );
        let mut runner = SystemRunner::new(system, NO_WAIT);

        assert_eq!(runner.convert(), OperationOutcome::Ok);
        assert_eq!(runner.amount_stored(), 0);
    }

    #[test]
    fn store_retains_what_does_not_fit() {
        let fuel = Resource::new("fuel", 10, 100);
        let thrust = Resource::new("thrust", 47, 50);
        let queue = Arc::new(EventQueue::new());
        let mut runner = engine(&fuel, &thrust, &queue);

        assert_eq!(runner.convert(), OperationOutcome::Ok);
        assert_eq!(runner.amount_stored(), 5);

        // Only 3 units fit; the remainder must be retried, not dropped.
        assert_eq!(runner.store(), OperationOutcome::Capacity);
        assert_eq!(thrust.amount(), 50);
        assert_eq!(runner.amount_stored(), 2);

        thrust.withdraw(10);
        assert_eq!(runner.store(), OperationOutcome::Ok);
        assert_eq!(thrust.amount(), 42);
        assert_eq!(runner.amount_stored(), 0);
    }

    #[test]
    fn failed_cycle_reports_high_priority_event() {
        let fuel = Resource::new("fuel", 0, 100);
        let thrust = Resource::new("thrust", 0, 50);
        let queue = Arc::new(EventQueue::new());
        let mut runner = engine(&fuel, &thrust, &queue);

        runner.cycle();

        let event = queue.pop().expect("failed conversion must be reported");
        assert_eq!(event.outcome, OperationOutcome::Empty);
        assert_eq!(event.priority, Priority::High);
        assert_eq!(event.resource_name(), "fuel");
        assert_eq!(event.amount, 0);
        assert_eq!(event.source, "engine");
        assert!(queue.is_empty());
    }

    #[test]
    fn capacity_cycle_reports_low_priority_event() {
        let fuel = Resource::new("fuel", 10, 100);
        let thrust = Resource::new("thrust", 50, 50);
        let queue = Arc::new(EventQueue::new());
        let mut runner = engine(&fuel, &thrust, &queue);

        runner.cycle();

        let event = queue.pop().expect("full store must be reported");
        assert_eq!(event.outcome, OperationOutcome::Capacity);
        assert_eq!(event.priority, Priority::Low);
        assert_eq!(event.resource_name(), "thrust");
        assert_eq!(event.amount, 50);
        assert_eq!(runner.amount_stored(), 5);
    }

    #[test]
    fn status_adjusts_and_terminates() {
        let queue = Arc::new(EventQueue::new());
        let system = System::new(
            "idle",
            ResourceAmount::none(),
            ResourceAmount::none(),
            Duration::from_millis(1),
            queue,
        );
        assert_eq!(system.status(), SystemStatus::Normal);
        system.set_status(SystemStatus::Fast);
        assert_eq!(system.status(), SystemStatus::Fast);

        system.set_status(SystemStatus::Terminate);
        let runner = SystemRunner::new(system.clone(), NO_WAIT);
        // Must observe the status at the top of the loop and return.
        runner.run();
    }
}
