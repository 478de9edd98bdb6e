//! `From` implementations bridging `soc_config` types to `soc_core` types.

use crate::extract::ExtractOptions;
use crate::training::TrainOptions;
use crate::types::CycleRecord;

// ── Processed CSV rows ───────────────────────────────────────────────────────

impl From<&CycleRecord> for soc_config::ProcessedRow {
    fn from(r: &CycleRecord) -> Self {
        Self {
            cycle_index: r.cycle_index,
            type_charge: u8::from(r.type_charge),
            type_discharge: u8::from(r.type_discharge),
            voltage_mean: r.voltage_mean,
            voltage_min: r.voltage_min,
            voltage_max: r.voltage_max,
            current_mean: r.current_mean,
            temperature_mean: r.temperature_mean,
            time_max: r.time_max,
            estimated_soc: r.estimated_soc,
        }
    }
}

impl From<&soc_config::ProcessedRow> for CycleRecord {
    fn from(r: &soc_config::ProcessedRow) -> Self {
        Self {
            cycle_index: r.cycle_index,
            type_charge: r.type_charge != 0,
            type_discharge: r.type_discharge != 0,
            voltage_mean: r.voltage_mean,
            voltage_min: r.voltage_min,
            voltage_max: r.voltage_max,
            current_mean: r.current_mean,
            temperature_mean: r.temperature_mean,
            time_max: r.time_max,
            estimated_soc: r.estimated_soc,
        }
    }
}

// ── Options ──────────────────────────────────────────────────────────────────

impl From<&soc_config::ExtractCfg> for ExtractOptions {
    fn from(c: &soc_config::ExtractCfg) -> Self {
        Self {
            max_unwrap_depth: c.max_unwrap_depth,
        }
    }
}

impl From<&soc_config::TrainingCfg> for TrainOptions {
    fn from(c: &soc_config::TrainingCfg) -> Self {
        Self {
            test_ratio: c.test_ratio,
            seed: c.seed,
            min_rows: c.min_rows,
            n_trees: c.n_trees,
            max_depth: c.max_depth,
        }
    }
}
