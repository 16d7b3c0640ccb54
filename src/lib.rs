#![forbid(unused_must_use)] // disallow discarding errors
#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

mod basics;
mod coordination;
mod simulation;
#[cfg(test)]
mod tests;

use crate::basics::OutputHandler;
use crate::coordination::Controller;
pub use basics::{
    ExecutionMode, OutputChannel, ScenarioSource, ScenarioSpec, SimConfig, Statistics, TimeFormat,
    TimeRepresentation, Verbosity, BACKOFF_FACTOR, DEFAULT_BASE_WAIT, DEFAULT_DURATION,
};
use clap::{App, AppSettings, Arg, ArgGroup, SubCommand};
use std::sync::Arc;
use std::time::Duration;

pub use crate::coordination::SimulationHandle;
pub use crate::simulation::{
    Event, EventQueue, OperationOutcome, Priority, Resource, ResourceAmount, System, SystemRunner, SystemStatus,
};

/**
`Config` combines a parsed scenario with a `SimConfig`.

The simulation configuration describes how the scenario should be executed.
The `Config` can then be turned into a `SimulationHandle` for use via the API
or simply executed.
*/
#[derive(Debug, Clone)]
pub struct Config {
    cfg: SimConfig,
    scenario: ScenarioSpec,
}

impl Config {
    /**
    Creates a new `Config` which can then be turned into a `SimulationHandle` by `into_handle`.
    */
    pub fn new_api(cfg: SimConfig, scenario: ScenarioSpec) -> Config {
        Config { cfg, scenario }
    }

    /**
    Parses command line arguments and returns a `Config` if successful.

    If the arguments are not valid, this function will print an error message and exit the process with value 1.
    */
    #[allow(dangerous_implicit_autorefs)]
    pub fn new(args: &[String]) -> Self {
        let parse_matches = App::new("spacesim")
        .version(env!("CARGO_PKG_VERSION"))
        .author(clap::crate_authors!("\n"))
        .about("spacesim simulates a network of concurrent resource-converting spacecraft subsystems.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("simulate")
            .about("Run the given scenario for a bounded wall-clock duration")
            .arg(
                Arg::with_name("SCENARIO")
                    .help("Sets the scenario file to use")
                    .index(1),
            )
            .arg(
                Arg::with_name("STDIN")
                    .help("Read the scenario from stdin")
                    .long("stdin")
            )
            .group(
                ArgGroup::with_name("INPUT")
                    .required(true)
                    .args(&["SCENARIO", "STDIN"])
            )
            .arg(
                Arg::with_name("DURATION")
                    .help("Wall-clock bound for the run, e.g. `30s` or `2min`")
                    .long("duration")
                    .takes_value(true)
                    .number_of_values(1)
            )
            .arg(
                Arg::with_name("BASE_WAIT")
                    .help("Base wait unit for loop pacing; backoff after failures is five times this")
                    .long("base-wait")
                    .takes_value(true)
                    .number_of_values(1)
            )
            .arg(
                Arg::with_name("STDOUT")
                    .help("Output to stdout")
                    .long("stdout")
            )
            .arg(
                Arg::with_name("STDERR")
                    .help("Output to stderr")
                    .long("stderr")
                    .conflicts_with("STDOUT")
            )
            .arg(
                Arg::with_name("VERBOSITY")
                    .help("Sets the verbosity\n")
                    .long("verbosity")
                    .possible_values(&["debug", "events", "warnings", "progress", "silent", "quiet"])
                    .default_value("events")
            )
            .arg(
                Arg::with_name("TIMEREPRESENTATION")
                    .help("Sets the event time info representation\n")
                    .long("time-info-rep")
                    .possible_values(&[
                        "hide",
                        "relative",
                        "relative_nanos", "relative_uint_nanos",
                        "relative_secs", "relative_float_secs",
                        "relative_human", "relative_human_time",
                        "absolute",
                        "absolute_nanos", "absolute_uint_nanos",
                        "absolute_secs", "absolute_float_secs",
                        "absolute_human", "absolute_human_time",
                    ])
                    .default_value("hide")
            )
        )
        .subcommand(
            SubCommand::with_name("validate")
            .about("Parses the scenario file and prints a summary")
            .arg(
                Arg::with_name("SCENARIO")
                    .help("Sets the scenario file to use")
                    .required(true)
                    .index(1),
            )
        )
        .get_matches_from(args);

        if let Some(parse_matches) = parse_matches.subcommand_matches("validate") {
            let filename = parse_matches.value_of("SCENARIO").map(|s| s.to_string()).unwrap();
            let scenario = ScenarioSpec::load(&ScenarioSource::file(filename)).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1)
            });
            for resource in &scenario.resources {
                println!("resource `{}`: {}/{}", resource.name, resource.initial_amount, resource.max_capacity);
            }
            for system in &scenario.systems {
                let describe = |binding: &Option<(String, u64)>| match binding {
                    Some((name, amount)) => format!("{} `{}`", amount, name),
                    None => "nothing".to_string(),
                };
                println!(
                    "system `{}`: converts {} into {} every {}ms",
                    system.name,
                    describe(&system.consumed),
                    describe(&system.produced),
                    system.processing_time_ms
                );
            }
            std::process::exit(0);
        }

        let parse_matches = if let Some(matches) = parse_matches.subcommand_matches("simulate") {
            matches
        } else {
            eprintln!("Unknown subcommand. See help for more information.");
            std::process::exit(1)
        };

        let src = if let Some(file) = parse_matches.value_of("SCENARIO") {
            ScenarioSource::file(String::from(file))
        } else {
            ScenarioSource::stdin()
        };

        let scenario = ScenarioSpec::load(&src).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1)
        });

        let duration = parse_humantime(parse_matches.value_of("DURATION"), "DURATION").unwrap_or(DEFAULT_DURATION);
        let base_wait = parse_humantime(parse_matches.value_of("BASE_WAIT"), "BASE_WAIT").unwrap_or(DEFAULT_BASE_WAIT);

        let out = if parse_matches.is_present("STDOUT") { OutputChannel::StdOut } else { OutputChannel::StdErr };

        use Verbosity::*;
        let verbosity = match parse_matches.value_of("VERBOSITY").unwrap() {
            "debug" => Debug,
            "events" => Events,
            "warnings" => WarningsOnly,
            "progress" => Progress,
            "silent" | "quiet" => Silent,
            _ => unreachable!(),
        };

        use TimeFormat::*;
        use TimeRepresentation::*;
        let time_representation = match parse_matches.value_of("TIMEREPRESENTATION").unwrap() {
            "hide" => Hide,
            "relative_nanos" | "relative_uint_nanos" => Relative(UIntNanos),
            "relative" | "relative_secs" | "relative_float_secs" => Relative(FloatSecs),
            "relative_human" | "relative_human_time" => Relative(HumanTime),
            "absolute_nanos" | "absolute_uint_nanos" => Absolute(UIntNanos),
            "absolute" | "absolute_secs" | "absolute_float_secs" => Absolute(FloatSecs),
            "absolute_human" | "absolute_human_time" => Absolute(HumanTime),
            _ => unreachable!(),
        };

        let cfg = SimConfig::new(
            src,
            Statistics::None,
            verbosity,
            out,
            ExecutionMode::Run,
            duration,
            base_wait,
            time_representation,
        );

        Config { cfg, scenario }
    }

    /**
    Turns a `Config` that was created through a call to `new_api` into a `SimulationHandle`.
    */
    pub fn into_handle(self) -> Result<SimulationHandle, Box<dyn std::error::Error>> {
        assert_eq!(self.cfg.mode, ExecutionMode::API);
        Controller::new(self.scenario, self.cfg).start().map(|res| res.left().unwrap())
    }

    /**
    Runs a `Config` that was created through a call to `new`.
    */
    pub fn run(self) -> Result<Arc<OutputHandler>, Box<dyn std::error::Error>> {
        Controller::new(self.scenario, self.cfg)
            .start()
            .map(|r| r.right().expect("Running the config should never return a handle."))
    }
}

fn parse_humantime(value: Option<&str>, what: &str) -> Option<Duration> {
    value.map(|s| {
        let d = s.parse::<humantime::Duration>().unwrap_or_else(|e| {
            eprintln!("Could not parse {} value `{}`: {}.", what, s, e);
            std::process::exit(1);
        });
        d.into()
    })
}
