use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::error::Error;
use std::fs::File;
use std::io::{stdin, Read};

/// Where the scenario description is read from.
#[derive(Debug, Clone)]
pub enum ScenarioSource {
    StdIn,
    File(String),
}

impl ScenarioSource {
    pub fn file(path: String) -> ScenarioSource {
        ScenarioSource::File(path)
    }

    pub fn stdin() -> ScenarioSource {
        ScenarioSource::StdIn
    }
}

#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub name: String,
    pub initial_amount: u64,
    pub max_capacity: u64,
}

#[derive(Debug, Clone)]
pub struct SystemSpec {
    pub name: String,
    /// Resource name and per-cycle amount; `None` when nothing is consumed.
    pub consumed: Option<(String, u64)>,
    /// Resource name and per-cycle amount; `None` when nothing is produced.
    pub produced: Option<(String, u64)>,
    pub processing_time_ms: u64,
}

/**
A parsed and validated scenario: the resources and subsystems a run is wired
from.

The on-disk format is headerless CSV with a leading record-type column;
lines starting with `#` are comments:

```text
resource,<name>,<initial_amount>,<max_capacity>
system,<name>,<consumed|->,<amount>,<produced|->,<amount>,<processing_ms>
```

A `-` in a resource column means "no resource involved" on that side.
*/
#[derive(Debug, Clone, Default)]
pub struct ScenarioSpec {
    pub resources: Vec<ResourceSpec>,
    pub systems: Vec<SystemSpec>,
}

impl ScenarioSpec {
    pub fn load(source: &ScenarioSource) -> Result<ScenarioSpec, Box<dyn Error>> {
        match source {
            ScenarioSource::StdIn => ScenarioSpec::from_reader(stdin()),
            ScenarioSource::File(path) => ScenarioSpec::from_reader(
                File::open(path).map_err(|e| format!("could not open scenario `{}`: {}", path, e))?,
            ),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ScenarioSpec, Box<dyn Error>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut spec = ScenarioSpec::default();
        for (ix, record) in csv_reader.records().enumerate() {
            let record = record?;
            let line = ix + 1;
            if record.len() == 0 || (record.len() == 1 && record[0].is_empty()) {
                continue;
            }
            match &record[0] {
                "resource" => spec.resources.push(parse_resource(&record, line)?),
                "system" => spec.systems.push(parse_system(&record, line)?),
                other => return Err(format!("line {}: unknown record type `{}`", line, other).into()),
            }
        }

        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        let mut resource_names = HashSet::new();
        for resource in &self.resources {
            if !resource_names.insert(resource.name.as_str()) {
                return Err(format!("duplicate resource `{}`", resource.name).into());
            }
            if resource.initial_amount > resource.max_capacity {
                return Err(format!(
                    "resource `{}`: initial amount {} exceeds capacity {}",
                    resource.name, resource.initial_amount, resource.max_capacity
                )
                .into());
            }
        }

        let mut system_names = HashSet::new();
        for system in &self.systems {
            if !system_names.insert(system.name.as_str()) {
                return Err(format!("duplicate system `{}`", system.name).into());
            }
            if system.processing_time_ms == 0 {
                return Err(format!("system `{}`: processing time must be positive", system.name).into());
            }
            for binding in system.consumed.iter().chain(system.produced.iter()) {
                if !resource_names.contains(binding.0.as_str()) {
                    return Err(format!(
                        "system `{}` references undefined resource `{}`",
                        system.name, binding.0
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}

fn parse_resource(record: &StringRecord, line: usize) -> Result<ResourceSpec, Box<dyn Error>> {
    if record.len() != 4 {
        return Err(format!("line {}: resource record needs 4 fields, got {}", line, record.len()).into());
    }
    Ok(ResourceSpec {
        name: record[1].to_string(),
        initial_amount: parse_amount(&record[2], line, "initial amount")?,
        max_capacity: parse_amount(&record[3], line, "max capacity")?,
    })
}

fn parse_system(record: &StringRecord, line: usize) -> Result<SystemSpec, Box<dyn Error>> {
    if record.len() != 7 {
        return Err(format!("line {}: system record needs 7 fields, got {}", line, record.len()).into());
    }
    let processing_time_ms = parse_amount(&record[6], line, "processing time")?;
    Ok(SystemSpec {
        name: record[1].to_string(),
        consumed: parse_binding(&record[2], &record[3], line)?,
        produced: parse_binding(&record[4], &record[5], line)?,
        processing_time_ms,
    })
}

fn parse_binding(name: &str, amount: &str, line: usize) -> Result<Option<(String, u64)>, Box<dyn Error>> {
    if name.is_empty() || name == "-" {
        return Ok(None);
    }
    Ok(Some((name.to_string(), parse_amount(amount, line, "binding amount")?)))
}

fn parse_amount(field: &str, line: usize, what: &str) -> Result<u64, Box<dyn Error>> {
    field
        .parse::<u64>()
        .map_err(|_| format!("line {}: {} `{}` is not a non-negative integer", line, what, field).into())
}
