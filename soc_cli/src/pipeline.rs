//! Offline commands: extract, label, train, summary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_json::json;
use soc_config::{Config, ProcessedRow};
use soc_core::{CycleRecord, ExtractOptions, SocError, TrainOptions};

use crate::output::emit;

pub fn run_extract(
    cfg: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    variable: Option<String>,
) -> eyre::Result<()> {
    let input = input.unwrap_or_else(|| cfg.paths.raw_file.clone());
    let output = output.unwrap_or_else(|| cfg.paths.processed_csv.clone());
    let key = variable
        .or_else(|| cfg.variable_for(&input))
        .ok_or_else(|| eyre::eyre!("cannot derive a variable name from {input:?}; pass --variable"))?;
    let opts: ExtractOptions = (&cfg.extract).into();

    tracing::info!(input = %input.display(), key = %key, "extracting cycles");
    let extraction = soc_core::extract_file(&input, Some(&key), &opts)?;
    let rows: Vec<ProcessedRow> = extraction.records.iter().map(ProcessedRow::from).collect();
    soc_config::write_processed_csv(&output, &rows)?;

    let skipped: Vec<_> = extraction
        .skipped
        .iter()
        .map(|s| json!({ "position": s.position, "reason": s.reason }))
        .collect();
    emit(
        &json!({
            "command": "extract",
            "input": input.display().to_string(),
            "output": output.display().to_string(),
            "variable": key,
            "records": rows.len(),
            "skipped": skipped,
        }),
        || {
            let mut s = format!(
                "Extracted {} cycles from {} into {}",
                rows.len(),
                input.display(),
                output.display()
            );
            for skip in &extraction.skipped {
                let _ = write!(s, "\n  skipped cycle {}: {}", skip.position, skip.reason);
            }
            s
        },
    );
    Ok(())
}

pub fn run_label(voltage: f64) {
    let soc = soc_core::soc_for_voltage(voltage);
    emit(
        &json!({ "command": "label", "voltage": voltage, "soc": soc }),
        || format!("{voltage} V -> {soc}% SOC"),
    );
}

pub fn run_train(
    cfg: &Config,
    input: Option<PathBuf>,
    model_dir: Option<PathBuf>,
) -> eyre::Result<()> {
    let input = input.unwrap_or_else(|| cfg.paths.processed_csv.clone());
    let model_dir = model_dir.unwrap_or_else(|| cfg.paths.model_dir.clone());
    let opts: TrainOptions = (&cfg.training).into();

    tracing::info!(input = %input.display(), model_dir = %model_dir.display(), "training");
    let artifact = soc_core::train_from_csv(&input, &model_dir, &opts)?;
    let info = &artifact.info;
    emit(
        &json!({
            "command": "train",
            "model_dir": model_dir.display().to_string(),
            "model_info": info,
        }),
        || {
            let mut s = format!(
                "Trained {} into {}\n  r2={} rmse={} mae={}\n  importances:",
                info.best_model_name,
                model_dir.display(),
                info.metrics.r2,
                info.metrics.rmse,
                info.metrics.mae
            );
            for (name, w) in &info.feature_importances {
                let _ = write!(s, "\n    {name:<18} {w:.4}");
            }
            s
        },
    );
    Ok(())
}

/// Load processed rows; a missing file is `SourceFileMissing`.
fn load_records(path: &Path) -> eyre::Result<Vec<CycleRecord>> {
    if !path.exists() {
        return Err(SocError::SourceFileMissing(path.display().to_string()).into());
    }
    let rows = soc_config::load_processed_csv(path)?;
    Ok(rows.iter().map(CycleRecord::from).collect())
}

pub fn run_summary(cfg: &Config, input: Option<PathBuf>) -> eyre::Result<()> {
    let input = input.unwrap_or_else(|| cfg.paths.processed_csv.clone());
    let records = load_records(&input)?;
    let summary = soc_core::summarize(&records);

    emit(
        &json!({ "command": "summary", "input": input.display().to_string(), "summary": summary }),
        || {
            let fmt_opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{x:.4}"));
            let mut s = format!(
                "{} cycles ({} charge, {} discharge)\n\n{:<18} {:>6} {:>7} {:>10} {:>10} {:>10} {:>10}",
                summary.rows,
                summary.charge_cycles,
                summary.discharge_cycles,
                "column",
                "count",
                "missing",
                "mean",
                "std",
                "min",
                "max"
            );
            for c in &summary.columns {
                let _ = write!(
                    s,
                    "\n{:<18} {:>6} {:>7} {:>10} {:>10} {:>10} {:>10}",
                    c.name,
                    c.count,
                    c.missing,
                    fmt_opt(c.mean),
                    fmt_opt(c.std),
                    fmt_opt(c.min),
                    fmt_opt(c.max)
                );
            }
            s.push_str("\n\nHighly correlated pairs (|r| > 0.7):");
            if summary.high_correlations.is_empty() {
                s.push_str("\n  none");
            }
            for c in &summary.high_correlations {
                let _ = write!(s, "\n  {} ~ {}: {:.3}", c.a, c.b, c.r);
            }
            s.push_str("\n\nSOC levels:");
            for (level, count) in &summary.soc_distribution {
                let _ = write!(s, "\n  {level:>3}%: {count}");
            }
            s
        },
    );
    Ok(())
}
