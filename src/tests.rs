//! End-to-end tests of the subsystem simulator.

use super::*;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

fn load_scenario(scenario: &str) -> ScenarioSpec {
    let mut file = NamedTempFile::new().expect("failed to create temporary file");
    write!(file, "{}", scenario).expect("writing tempfile failed");
    ScenarioSpec::load(&ScenarioSource::file(file.path().to_str().unwrap().to_string()))
        .unwrap_or_else(|e| panic!("scenario is invalid: {}", e))
}

fn api_handle(scenario: &str) -> SimulationHandle {
    let scenario = load_scenario(scenario);
    let cfg = SimConfig::new(
        ScenarioSource::stdin(),
        Statistics::None,
        Verbosity::Silent,
        OutputChannel::None,
        ExecutionMode::API,
        DEFAULT_DURATION,
        Duration::from_millis(1),
        TimeRepresentation::Hide,
    );
    Config::new_api(cfg, scenario).into_handle().unwrap_or_else(|e| panic!("simulation failed to start: {}", e))
}

/// Polls `condition` for up to two seconds.
fn eventually<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn starved_engine_reports_empty_fuel() {
    let handle = api_handle(
        "resource,fuel,0,100\n\
         resource,thrust,0,50\n\
         system,engine,fuel,10,thrust,5,10\n",
    );

    let mut first = None;
    assert!(
        eventually(|| {
            first = handle.poll_event();
            first.is_some()
        }),
        "starved engine never reported an event"
    );

    let event = first.unwrap();
    assert_eq!(event.outcome, OperationOutcome::Empty);
    assert_eq!(event.priority, Priority::High);
    assert_eq!(event.resource_name(), "fuel");
    assert_eq!(event.source, "engine");
    assert_eq!(event.amount, 0);

    handle.shutdown();
}

#[test]
fn fueled_engine_completes_a_silent_cycle() {
    let handle = api_handle(
        "resource,fuel,10,100\n\
         resource,thrust,0,50\n\
         system,engine,fuel,10,thrust,5,10\n",
    );

    let thrust = handle.resource("thrust").expect("thrust must exist").clone();
    assert!(eventually(|| thrust.amount() == 5), "engine never stored its output");
    assert_eq!(handle.resource("fuel").unwrap().amount(), 0);

    // The one fueled cycle is silent; anything queued afterwards stems from
    // the now-empty tank.
    while let Some(event) = handle.poll_event() {
        assert_eq!(event.outcome, OperationOutcome::Empty);
        assert_eq!(event.resource_name(), "fuel");
    }

    handle.shutdown();
}

#[test]
fn overproduction_reports_capacity_events() {
    let handle = api_handle(
        "resource,tank,0,5\n\
         system,generator,-,0,tank,10,5\n",
    );

    let mut first = None;
    assert!(
        eventually(|| {
            first = handle.poll_event();
            first.is_some()
        }),
        "overfull tank never reported an event"
    );

    let event = first.unwrap();
    assert_eq!(event.outcome, OperationOutcome::Capacity);
    assert_eq!(event.priority, Priority::Low);
    assert_eq!(event.resource_name(), "tank");
    assert_eq!(handle.resource("tank").unwrap().amount(), 5);

    handle.shutdown();
}

#[test]
fn status_change_is_observed_by_the_worker() {
    let handle = api_handle(
        "resource,fuel,1000,1000\n\
         resource,thrust,0,1000\n\
         system,engine,fuel,10,thrust,5,1\n",
    );

    assert!(handle.set_status("engine", SystemStatus::Fast));
    assert_eq!(handle.system("engine").unwrap().status(), SystemStatus::Fast);
    assert!(!handle.set_status("reactor", SystemStatus::Slow));

    let thrust = handle.resource("thrust").expect("thrust must exist").clone();
    assert!(eventually(|| thrust.amount() >= 5), "fast engine never produced");

    handle.shutdown();
}

#[test]
fn bounded_run_counts_events() {
    let scenario = load_scenario(
        "resource,fuel,0,100\n\
         resource,thrust,0,50\n\
         system,engine,fuel,10,thrust,5,5\n",
    );
    let cfg = SimConfig::new(
        ScenarioSource::stdin(),
        Statistics::Debug,
        Verbosity::Silent,
        OutputChannel::None,
        ExecutionMode::Run,
        Duration::from_millis(300),
        Duration::from_millis(2),
        TimeRepresentation::Hide,
    );
    let config = Config { cfg, scenario };

    let output_handler = config.run().unwrap_or_else(|e| panic!("E2E test failed: {}", e));
    let statistics = output_handler.statistics.as_ref().expect("statistics were requested");
    assert!(statistics.num_events() >= 1, "no events observed in 300ms");
    assert_eq!(statistics.num_with_outcome(OperationOutcome::Empty), statistics.num_events());
}
