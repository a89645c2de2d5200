//! Scripted trace workload
//!
//! Plays the in-process trace system: checks each event's category group
//! against the exporter and hands enabled events over, from several worker
//! threads at once.

use crate::config::{ArgConfig, EventConfig};
use anyhow::{bail, Context, Result};
use etw_export::{phase, ArgValue, ConvertableToJson, TraceArg, TraceExporter};
use rayon::prelude::*;
use std::ops::Add;
use std::sync::Arc;

/// Structured argument value rendered from the config as JSON
struct JsonValue(String);

impl ConvertableToJson for JsonValue {
    fn append_as_json(&self, out: &mut String) {
        out.push_str(&self.0);
    }
}

/// One event ready to be emitted
#[derive(Debug, Clone)]
pub struct ScriptedEvent {
    pub phase: u8,
    pub category_group: String,
    pub name: String,
    pub id: u64,
    pub args: Vec<TraceArg>,
    pub repeat: usize,
    pub complete_end: bool,
}

/// Counters collected while replaying a workload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadStats {
    /// Emissions attempted
    pub offered: usize,
    /// Emissions whose category group was enabled
    pub exported: usize,
    /// "Complete End" events exported
    pub complete_ends: usize,
}

impl Add for WorkloadStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            offered: self.offered + other.offered,
            exported: self.exported + other.exported,
            complete_ends: self.complete_ends + other.complete_ends,
        }
    }
}

impl TryFrom<&EventConfig> for ScriptedEvent {
    type Error = anyhow::Error;

    fn try_from(config: &EventConfig) -> Result<Self> {
        let phase = match config.phase.as_bytes() {
            [code] => *code,
            _ => bail!(
                "Event {:?}: phase must be a single ASCII character, got {:?}",
                config.name,
                config.phase
            ),
        };
        if config.category_group.is_empty() {
            bail!("Event {:?}: category_group must not be empty", config.name);
        }

        let args = config
            .args
            .iter()
            .map(convert_arg)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Event {:?}: invalid argument", config.name))?;

        Ok(Self {
            phase,
            category_group: config.category_group.clone(),
            name: config.name.clone(),
            id: config.id,
            args,
            repeat: config.repeat,
            complete_end: config.complete_end,
        })
    }
}

fn convert_arg(arg: &ArgConfig) -> Result<TraceArg> {
    let value = match &arg.value {
        toml::Value::Boolean(v) => ArgValue::Bool(*v),
        toml::Value::Integer(v) if *v >= 0 => ArgValue::Uint(*v as u64),
        toml::Value::Integer(v) => ArgValue::Int(*v),
        toml::Value::Float(v) => ArgValue::Double(*v),
        toml::Value::String(v) => ArgValue::CopyString(v.clone()),
        toml::Value::Datetime(v) => ArgValue::CopyString(v.to_string()),
        structured @ (toml::Value::Array(_) | toml::Value::Table(_)) => {
            let json = serde_json::to_string(structured)?;
            ArgValue::Convertable(Arc::new(JsonValue(json)))
        }
    };
    Ok(TraceArg::new(arg.name.clone(), value))
}

/// Build a workload from config entries
pub fn from_config(events: &[EventConfig]) -> Result<Vec<ScriptedEvent>> {
    events.iter().map(ScriptedEvent::try_from).collect()
}

/// Built-in workload used when no events are configured
pub fn default_workload() -> Vec<ScriptedEvent> {
    let event = |phase: u8, group: &str, name: &str, args: Vec<TraceArg>| ScriptedEvent {
        phase,
        category_group: group.to_string(),
        name: name.to_string(),
        id: 0,
        args,
        repeat: 1,
        complete_end: false,
    };

    vec![
        event(phase::BEGIN, "benchmark", "RunBenchmark", vec![TraceArg::new("iteration", 1u64)]),
        event(phase::END, "benchmark", "RunBenchmark", vec![]),
        ScriptedEvent {
            complete_end: true,
            ..event(
                phase::COMPLETE,
                "cc,disabled-by-default-cc.debug",
                "DrawFrame",
                vec![
                    TraceArg::new("layers", ArgValue::Convertable(Arc::new(JsonValue(
                        r#"{"count":4}"#.to_string(),
                    )))),
                    TraceArg::new("frame", 12u64),
                ],
            )
        },
        event(phase::INSTANT, "gpu", "SwapBuffers", vec![TraceArg::new("vsync", true)]),
        event(phase::ASYNC_BEGIN, "netlog", "URLRequest", vec![TraceArg::new("url", "https://example.org/")]),
        event(phase::COUNTER, "renderer", "HeapSize", vec![TraceArg::new("bytes", 1.5e6)]),
        event(phase::INSTANT, "disabled-by-default-memory-infra", "Dump", vec![]),
    ]
}

/// Replay the workload on `threads` workers
pub fn run(exporter: &TraceExporter, events: &[ScriptedEvent], threads: usize) -> Result<WorkloadStats> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("Failed to build worker pool")?;

    let stats = pool.install(|| {
        events
            .par_iter()
            .flat_map(|event| (0..event.repeat).into_par_iter().map(move |_| event))
            .map(|event| emit(exporter, event))
            .reduce(WorkloadStats::default, |a, b| a + b)
    });

    log::debug!("Workload finished: {:?}", stats);
    Ok(stats)
}

fn emit(exporter: &TraceExporter, event: &ScriptedEvent) -> WorkloadStats {
    let mut stats = WorkloadStats {
        offered: 1,
        ..Default::default()
    };

    if !exporter.is_category_group_enabled(&event.category_group) {
        return stats;
    }

    exporter.add_event(event.phase, 0, &event.name, event.id, &event.args);
    stats.exported = 1;

    if event.complete_end {
        exporter.add_complete_end_event(&event.name);
        stats.complete_ends = 1;
    }
    stats
}
