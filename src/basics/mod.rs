mod config;
mod io_handler;
mod scenario;

pub(crate) type Time = Duration;

pub use self::config::{
    ExecutionMode, SimConfig, Statistics, TimeFormat, TimeRepresentation, Verbosity, BACKOFF_FACTOR,
    DEFAULT_BASE_WAIT, DEFAULT_DURATION,
};
pub use self::io_handler::OutputChannel;
pub(crate) use self::io_handler::OutputHandler;

pub use self::scenario::{ResourceSpec, ScenarioSource, ScenarioSpec, SystemSpec};
use std::time::Duration;
