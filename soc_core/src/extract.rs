//! Cycle extraction: nested measurement record → ordered `CycleRecord`s.
//!
//! Extraction is all-or-nothing at the file level (a missing top-level
//! variable or `cycle` field aborts) and best-effort per cycle: a cycle that
//! cannot be read is logged, reported in [`Extraction::skipped`], and left out.
use std::path::Path;

use soc_traits::{Node, Variables};

use crate::error::SocError;
use crate::types::CycleRecord;

pub const VOLTAGE_CHANNEL: &str = "Voltage_measured";
pub const CURRENT_CHANNEL: &str = "Current_measured";
pub const TEMPERATURE_CHANNEL: &str = "Temperature_measured";
pub const TIME_CHANNEL: &str = "Time";

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Bound on consecutive single-element unwraps.
    pub max_unwrap_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_unwrap_depth: 32,
        }
    }
}

/// A source cycle left out of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCycle {
    /// 1-based position in the source `cycle` sequence.
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<CycleRecord>,
    pub skipped: Vec<SkippedCycle>,
}

/// Strip redundant single-element wrappers.
///
/// A one-item `List` yields its item and a one-sample `Array` yields a
/// `Number`. Records, scalars, text and multi-element containers are
/// returned as-is. Each unwrap strictly shrinks the value, and more than
/// `max_depth` unwraps is an error.
pub fn safe_extract(node: &Node, max_depth: usize) -> Result<Node, SocError> {
    let mut current = node;
    for _ in 0..=max_depth {
        match current {
            Node::List(items) if items.len() == 1 => current = &items[0],
            Node::Array(values) if values.len() == 1 => return Ok(Node::Number(values[0])),
            other => return Ok(other.clone()),
        }
    }
    Err(SocError::UnwrapDepthExceeded(max_depth))
}

/// Borrowing variant of [`safe_extract`] for container traversal.
fn unwrap_ref(node: &Node, max_depth: usize) -> Result<&Node, SocError> {
    let mut current = node;
    for _ in 0..=max_depth {
        match current {
            Node::List(items) if items.len() == 1 => current = &items[0],
            other => return Ok(other),
        }
    }
    Err(SocError::UnwrapDepthExceeded(max_depth))
}

/// Extract every cycle of the battery record stored under `key`.
pub fn extract_cycles(
    vars: &Variables,
    key: &str,
    opts: &ExtractOptions,
) -> Result<Extraction, SocError> {
    let Some(top) = vars.get(key) else {
        let available: Vec<String> = vars.keys().cloned().collect();
        tracing::error!(key, available = ?available, "battery variable not found");
        return Err(SocError::KeyNotFound {
            key: key.to_string(),
            available,
        });
    };
    let battery = unwrap_ref(top, opts.max_unwrap_depth)?;
    let Some(cycle_node) = battery.field("cycle") else {
        let available = battery.field_names();
        tracing::error!(key, available = ?available, "battery record has no cycle field");
        return Err(SocError::KeyNotFound {
            key: "cycle".to_string(),
            available,
        });
    };

    let cycle_node = unwrap_ref(cycle_node, opts.max_unwrap_depth)?;
    let cycles: Vec<&Node> = match cycle_node {
        Node::List(items) => {
            let mut cycles = Vec::with_capacity(items.len());
            for item in items {
                flatten_cycles(item, opts.max_unwrap_depth, &mut cycles)?;
            }
            cycles
        }
        Node::Record(_) => vec![cycle_node],
        Node::Array(values) if values.is_empty() => Vec::new(),
        other => {
            return Err(SocError::MalformedRecord(format!(
                "{key}.cycle is a {}, expected a sequence of records",
                other.kind()
            )));
        }
    };

    let mut out = Extraction::default();
    for (i, node) in cycles.into_iter().enumerate() {
        let position = i + 1;
        match cycle_record(node, opts.max_unwrap_depth) {
            Ok(mut record) => {
                record.cycle_index = u32::try_from(out.records.len() + 1).unwrap_or(u32::MAX);
                record.relabel();
                out.records.push(record);
            }
            Err(reason) => {
                let err = SocError::CycleProcessing {
                    position,
                    reason: reason.clone(),
                };
                tracing::warn!(position, error = %err, "skipping cycle");
                out.skipped.push(SkippedCycle { position, reason });
            }
        }
    }
    tracing::info!(
        key,
        extracted = out.records.len(),
        skipped = out.skipped.len(),
        "cycle extraction finished"
    );
    Ok(out)
}

/// Read `path` and extract the battery record under `key` (default: file stem).
pub fn extract_file(
    path: &Path,
    key: Option<&str>,
    opts: &ExtractOptions,
) -> Result<Extraction, SocError> {
    if !path.exists() {
        return Err(SocError::SourceFileMissing(path.display().to_string()));
    }
    let vars = soc_reader::read_variables(path)?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let key = key.unwrap_or(stem);
    extract_cycles(&vars, key, opts)
}

/// Splice nested multi-element lists of records into `out`.
///
/// Single-element wrappers are left for [`cycle_record`] so a degenerate
/// cycle is reported at its own position.
fn flatten_cycles<'a>(
    node: &'a Node,
    max_depth: usize,
    out: &mut Vec<&'a Node>,
) -> Result<(), SocError> {
    let mut stack = vec![(node, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        match node {
            Node::List(items)
                if items.len() > 1
                    && items
                        .iter()
                        .all(|n| matches!(n, Node::List(_) | Node::Record(_))) =>
            {
                if depth >= max_depth {
                    return Err(SocError::UnwrapDepthExceeded(max_depth));
                }
                stack.extend(items.iter().rev().map(|n| (n, depth + 1)));
            }
            other => out.push(other),
        }
    }
    Ok(())
}

fn cycle_record(node: &Node, depth: usize) -> Result<CycleRecord, String> {
    let cycle = unwrap_ref(node, depth).map_err(|e| e.to_string())?;
    if !matches!(cycle, Node::Record(_)) {
        return Err(format!("cycle is a {}, expected a record", cycle.kind()));
    }

    let mut labels = Vec::new();
    if let Some(t) = cycle.field("type") {
        collect_labels(t, depth, &mut labels)?;
    }

    let data = cycle.field("data").ok_or("missing data field")?;
    let data = unwrap_ref(data, depth).map_err(|e| e.to_string())?;
    if !matches!(data, Node::Record(_)) {
        return Err(format!("data is a {}, expected a record", data.kind()));
    }

    let voltage = channel(data, VOLTAGE_CHANNEL, depth)?;
    let current = channel(data, CURRENT_CHANNEL, depth)?;
    let temperature = channel(data, TEMPERATURE_CHANNEL, depth)?;
    let time = channel(data, TIME_CHANNEL, depth)?;

    Ok(CycleRecord {
        cycle_index: 0,
        type_charge: labels.iter().any(|l| l == "charge"),
        type_discharge: labels.iter().any(|l| l == "discharge"),
        voltage_mean: voltage.as_deref().map(mean),
        voltage_min: voltage
            .as_deref()
            .map(|v| v.iter().copied().fold(f64::INFINITY, f64::min)),
        voltage_max: voltage
            .as_deref()
            .map(|v| v.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        current_mean: current.as_deref().map(mean),
        temperature_mean: temperature.as_deref().map(mean),
        time_max: time
            .as_deref()
            .map(|v| v.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        estimated_soc: 0.0,
    })
}

fn collect_labels(node: &Node, depth: usize, out: &mut Vec<String>) -> Result<(), String> {
    match node {
        Node::Text(s) => out.push(s.trim().to_string()),
        Node::List(items) => {
            if depth == 0 {
                return Err(SocError::UnwrapDepthExceeded(0).to_string());
            }
            for item in items {
                collect_labels(item, depth - 1, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Flattened samples of `name`, `None` when the channel is absent.
fn channel(data: &Node, name: &str, depth: usize) -> Result<Option<Vec<f64>>, String> {
    let Some(node) = data.field(name) else {
        return Ok(None);
    };
    let mut samples = Vec::new();
    flatten(node, depth, &mut samples).map_err(|kind| format!("channel {name} holds {kind}"))?;
    if samples.is_empty() {
        return Err(format!("channel {name} has no samples"));
    }
    Ok(Some(samples))
}

fn flatten(node: &Node, depth: usize, out: &mut Vec<f64>) -> Result<(), &'static str> {
    match node {
        Node::Number(v) => out.push(*v),
        Node::Array(values) => out.extend_from_slice(values),
        Node::List(items) => {
            if depth == 0 {
                return Err("too deeply nested values");
            }
            for item in items {
                flatten(item, depth - 1, out)?;
            }
        }
        Node::Text(_) => return Err("text"),
        Node::Record(_) => return Err("a record"),
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
