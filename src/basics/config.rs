use super::{OutputChannel, ScenarioSource};
use std::time::Duration;

/// Base wait unit shared by loop pacing and failure backoff.
pub const DEFAULT_BASE_WAIT: Duration = Duration::from_millis(10);

/// Backoff after a failed convert/store, in multiples of the base wait.
pub const BACKOFF_FACTOR: u32 = 5;

/// Wall-clock bound of a `simulate` run unless overridden on the command line.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub scenario: ScenarioSource,
    pub statistics: Statistics,
    pub verbosity: Verbosity,
    pub output_channel: OutputChannel,
    pub mode: ExecutionMode,
    pub duration: Duration,
    pub base_wait: Duration,
    pub time_presentation: TimeRepresentation,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Verbosity {
    /// Suppresses any kind of logging.
    Silent,
    /// Prints statistical information like number of observed events.
    Progress,
    /// Prints nothing but high-priority events and runtime warnings about
    /// potentially critical states, e.g. a hung-up monitor.
    WarningsOnly,
    /// Prints every event popped from the queue.
    Events,
    /// Prints fine-grained debug information. Not suitable for production.
    Debug,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExecutionMode {
    /// Bounded wall-clock run driven by the binary.
    Run,
    /// Hands an embedding driver a `SimulationHandle`.
    API,
}

/// Collect statistics about the run even when they are not displayed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Statistics {
    None,
    Debug,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeRepresentation {
    Hide,
    Relative(TimeFormat),
    Absolute(TimeFormat),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeFormat {
    UIntNanos,
    FloatSecs,
    HumanTime,
}

impl SimConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scenario: ScenarioSource,
        statistics: Statistics,
        verbosity: Verbosity,
        output: OutputChannel,
        mode: ExecutionMode,
        duration: Duration,
        base_wait: Duration,
        time_presentation: TimeRepresentation,
    ) -> Self {
        SimConfig {
            scenario,
            statistics,
            verbosity,
            output_channel: output,
            mode,
            duration,
            base_wait,
            time_presentation,
        }
    }

    pub fn api(scenario: ScenarioSource) -> Self {
        let mut cfg = SimConfig::default();
        cfg.scenario = scenario;
        cfg.mode = ExecutionMode::API;
        cfg
    }
}

impl Default for SimConfig {
    fn default() -> SimConfig {
        SimConfig {
            scenario: ScenarioSource::StdIn,
            statistics: Statistics::None,
            verbosity: Verbosity::Events,
            output_channel: OutputChannel::StdErr,
            mode: ExecutionMode::Run,
            duration: DEFAULT_DURATION,
            base_wait: DEFAULT_BASE_WAIT,
            time_presentation: TimeRepresentation::Hide,
        }
    }
}
