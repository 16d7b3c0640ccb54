#![allow(clippy::mutex_atomic)]

use super::{SimConfig, TimeFormat, TimeRepresentation, Verbosity};
use crate::basics::Time;
use crate::simulation::{Event, OperationOutcome, Priority};
use crossterm::{cursor, terminal, ClearType};
use std::fs::File;
use std::io::{stderr, stdout, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum OutputChannel {
    StdOut,
    StdErr,
    File(String),
    None,
}

/// Forwards simulation output to the configured channel, gated by verbosity.
#[derive(Debug)]
pub struct OutputHandler {
    pub(crate) verbosity: Verbosity,
    channel: OutputChannel,
    file: Option<File>,
    pub(crate) statistics: Option<Statistics>,
    pub(crate) start_time: Mutex<SystemTime>,
    time_representation: TimeRepresentation,
}

impl OutputHandler {
    pub(crate) fn new(config: &SimConfig) -> OutputHandler {
        let statistics = if config.verbosity == Verbosity::Progress {
            let stats = Statistics::new();
            stats.start_print_progress();
            Some(stats)
        } else if config.statistics == crate::basics::Statistics::Debug {
            Some(Statistics::new())
        } else {
            None
        };
        OutputHandler {
            verbosity: config.verbosity,
            channel: config.output_channel.clone(),
            file: None,
            statistics,
            start_time: Mutex::new(SystemTime::now()),
            time_representation: config.time_presentation,
        }
    }

    pub(crate) fn runtime_warning<F, T: Into<String>>(&self, msg: F)
    where
        F: FnOnce() -> T,
    {
        self.emit(Verbosity::WarningsOnly, msg);
    }

    fn time_info(&self, time: Time) -> Option<String> {
        use TimeFormat::*;
        use TimeRepresentation::*;
        match self.time_representation {
            Hide => None,
            Relative(format) => {
                let d = time;
                match format {
                    UIntNanos => Some(format!("{}", d.as_nanos())),
                    FloatSecs => Some(format!("{}.{:09}", d.as_secs(), d.subsec_nanos())),
                    HumanTime => Some(format!("{}", humantime::format_duration(d))),
                }
            }
            Absolute(format) => {
                let mut d = time;
                d += self
                    .start_time
                    .lock()
                    .unwrap()
                    .duration_since(UNIX_EPOCH)
                    .expect("Computation of duration failed!");
                match format {
                    UIntNanos => Some(format!("{}", d.as_nanos())),
                    FloatSecs => Some(format!("{}.{:09}", d.as_secs(), d.subsec_nanos())),
                    HumanTime => {
                        let ts = UNIX_EPOCH + d;
                        Some(format!("{}", humantime::format_rfc3339(ts)))
                    }
                }
            }
        }
    }

    /// Logs an event popped from the shared queue. High-priority events are
    /// reported at warnings level, everything else at events level.
    pub(crate) fn event(&self, event: &Event, time: Time) {
        let msg = || {
            let description = format!(
                "[{}] {}: resource `{}` {} (amount {})",
                event.priority,
                event.source,
                event.resource_name(),
                event.outcome,
                event.amount
            );
            if let Some(ti) = self.time_info(time) {
                format!("{}: {}", ti, description)
            } else {
                description
            }
        };
        let level = if event.priority == Priority::High { Verbosity::WarningsOnly } else { Verbosity::Events };
        self.emit(level, msg);
        if let Some(statistics) = &self.statistics {
            statistics.event(event);
        }
    }

    pub(crate) fn debug<F, T: Into<String>>(&self, msg: F)
    where
        F: FnOnce() -> T,
    {
        self.emit(Verbosity::Debug, msg);
    }

    /// Accepts a message and forwards it to the appropriate output channel.
    /// If the configuration prohibits printing the message, `msg` is never called.
    fn emit<F, T: Into<String>>(&self, kind: Verbosity, msg: F)
    where
        F: FnOnce() -> T,
    {
        if kind <= self.verbosity {
            self.print(msg().into());
        }
    }

    fn print(&self, msg: String) {
        let _ = match self.channel {
            OutputChannel::StdOut => stdout().write((msg + "\n").as_bytes()),
            OutputChannel::StdErr => stderr().write((msg + "\n").as_bytes()),
            OutputChannel::File(_) => self.file.as_ref().unwrap().write(msg.as_bytes()),
            OutputChannel::None => Ok(0),
        };
    }

    pub(crate) fn terminate(&self) {
        if let Some(statistics) = &self.statistics {
            if self.verbosity == Verbosity::Progress {
                statistics.terminate();
            }
        }
    }
}

#[derive(Debug)]
struct StatisticsData {
    start: SystemTime,
    num_events: AtomicU64,
    num_high_priority: AtomicU64,
    num_empty: AtomicU64,
    num_insufficient: AtomicU64,
    num_capacity: AtomicU64,
    done: Mutex<bool>,
}

impl StatisticsData {
    fn new() -> Self {
        Self {
            start: SystemTime::now(),
            num_events: AtomicU64::new(0),
            num_high_priority: AtomicU64::new(0),
            num_empty: AtomicU64::new(0),
            num_insufficient: AtomicU64::new(0),
            num_capacity: AtomicU64::new(0),
            done: Mutex::new(false),
        }
    }
}

/// Event counters shared with the progress display thread.
#[derive(Debug, Clone)]
pub(crate) struct Statistics {
    data: Arc<StatisticsData>,
}

impl Statistics {
    fn new() -> Self {
        let data = Arc::new(StatisticsData::new());
        Statistics { data }
    }

    fn start_print_progress(&self) {
        // print intitial info
        Self::print_progress_info(&self.data, ' ');
        let copy = self.data.clone();
        thread::spawn(move || {
            // this thread is responsible for displaying progress information
            let mut spinner = "⠁⠁⠉⠙⠚⠒⠂⠂⠒⠲⠴⠤⠄⠄⠤⠠⠠⠤⠦⠖⠒⠐⠐⠒⠓⠋⠉⠈⠈ ".chars().cycle();
            loop {
                thread::sleep(Duration::from_millis(100));
                #[allow(clippy::mutex_atomic)]
                let done = copy.done.lock().unwrap();
                if *done {
                    return;
                }
                Self::clear_progress_info();
                Self::print_progress_info(&copy, spinner.next().unwrap());
            }
        });
    }

    fn event(&self, event: &Event) {
        self.data.num_events.fetch_add(1, Ordering::Relaxed);
        if event.priority == Priority::High {
            self.data.num_high_priority.fetch_add(1, Ordering::Relaxed);
        }
        match event.outcome {
            OperationOutcome::Empty => self.data.num_empty.fetch_add(1, Ordering::Relaxed),
            OperationOutcome::Insufficient => self.data.num_insufficient.fetch_add(1, Ordering::Relaxed),
            OperationOutcome::Capacity => self.data.num_capacity.fetch_add(1, Ordering::Relaxed),
            OperationOutcome::Ok => 0,
        };
    }

    #[allow(clippy::mutex_atomic)]
    pub(crate) fn terminate(&self) {
        let mut done = self.data.done.lock().unwrap();
        Self::clear_progress_info();
        Self::print_progress_info(&self.data, ' ');
        *done = true;
    }

    fn print_progress_info(data: &Arc<StatisticsData>, spin_char: char) {
        let mut out = stderr();

        // write event statistics
        let now = SystemTime::now();
        let elapsed_total = now.duration_since(data.start).unwrap().as_nanos();
        let num_events: u128 = data.num_events.load(Ordering::Relaxed).into();
        if num_events > 0 {
            let events_per_second = (num_events * Duration::from_secs(1).as_nanos()) / elapsed_total;
            writeln!(out, "{} {} events, {} events per second", spin_char, num_events, events_per_second)
                .unwrap_or_else(|_| {});
        } else {
            writeln!(out, "{} {} events", spin_char, num_events).unwrap_or_else(|_| {});
        }

        // write high-priority statistics
        let num_high = data.num_high_priority.load(Ordering::Relaxed);
        writeln!(out, "  {} high priority", num_high).unwrap_or_else(|_| {});
    }

    fn clear_progress_info() {
        let terminal = terminal();
        // clear screen as much as written in `print_progress_info`
        cursor().move_up(1);
        terminal.clear(ClearType::CurrentLine).unwrap_or_else(|_| {});
        cursor().move_up(1);
        terminal.clear(ClearType::CurrentLine).unwrap_or_else(|_| {});
    }

    #[cfg(test)]
    pub(crate) fn num_events(&self) -> u64 {
        self.data.num_events.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn num_with_outcome(&self, outcome: OperationOutcome) -> u64 {
        match outcome {
            OperationOutcome::Empty => self.data.num_empty.load(Ordering::Relaxed),
            OperationOutcome::Insufficient => self.data.num_insufficient.load(Ordering::Relaxed),
            OperationOutcome::Capacity => self.data.num_capacity.load(Ordering::Relaxed),
            OperationOutcome::Ok => 0,
        }
    }
}
