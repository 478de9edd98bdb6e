//! Descriptive summary of a processed table.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::labeler::soc_for_voltage;
use crate::types::CycleRecord;

/// Pairs whose absolute Pearson correlation exceeds this are reported.
pub const HIGH_CORRELATION: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: &'static str,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub a: &'static str,
    pub b: &'static str,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub charge_cycles: usize,
    pub discharge_cycles: usize,
    pub columns: Vec<ColumnStats>,
    pub high_correlations: Vec<Correlation>,
    /// Labeler level → number of cycles at that level.
    pub soc_distribution: BTreeMap<u32, usize>,
}

type Column = (&'static str, Vec<Option<f64>>);

fn columns(records: &[CycleRecord]) -> Vec<Column> {
    let col = |name, f: fn(&CycleRecord) -> Option<f64>| -> Column {
        (name, records.iter().map(f).collect())
    };
    vec![
        col("voltage_mean", |r| r.voltage_mean),
        col("voltage_min", |r| r.voltage_min),
        col("voltage_max", |r| r.voltage_max),
        col("current_mean", |r| r.current_mean),
        col("temperature_mean", |r| r.temperature_mean),
        col("time_max", |r| r.time_max),
        col("estimated_soc", |r| Some(r.estimated_soc)),
    ]
}

#[allow(clippy::cast_precision_loss)]
fn describe(name: &'static str, values: &[Option<f64>]) -> ColumnStats {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    let count = present.len();
    let mean = (count > 0).then(|| present.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        (present.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    });
    ColumnStats {
        name,
        count,
        missing: values.len() - count,
        mean,
        std,
        min: present.iter().copied().reduce(f64::min),
        max: present.iter().copied().reduce(f64::max),
    }
}

/// Pearson r over rows where both columns are present; `None` when undefined.
#[allow(clippy::cast_precision_loss)]
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn summarize(records: &[CycleRecord]) -> Summary {
    let cols = columns(records);

    let mut high_correlations = Vec::new();
    for (i, (a, xs)) in cols.iter().enumerate() {
        for (b, ys) in &cols[i + 1..] {
            if let Some(r) = pearson(xs, ys).filter(|r| r.abs() > HIGH_CORRELATION) {
                high_correlations.push(Correlation { a: *a, b: *b, r });
            }
        }
    }

    let mut soc_distribution = BTreeMap::new();
    for r in records {
        let level = soc_for_voltage(r.voltage_mean.unwrap_or(f64::NAN)) as u32;
        *soc_distribution.entry(level).or_insert(0) += 1;
    }

    Summary {
        rows: records.len(),
        charge_cycles: records.iter().filter(|r| r.type_charge).count(),
        discharge_cycles: records.iter().filter(|r| r.type_discharge).count(),
        columns: cols.iter().map(|(name, v)| describe(*name, v)).collect(),
        high_correlations,
        soc_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_perfect_and_undefined() {
        let a = [Some(1.0), Some(2.0), Some(3.0)];
        let b = [Some(2.0), Some(4.0), Some(6.0)];
        let c = [Some(-1.0), Some(-2.0), None];
        let flat = [Some(5.0), Some(5.0), Some(5.0)];
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&a, &flat), None);
    }

    #[test]
    fn describe_counts_missing() {
        let s = describe("x", &[Some(1.0), None, Some(3.0)]);
        assert_eq!(s.count, 2);
        assert_eq!(s.missing, 1);
        assert_eq!(s.mean, Some(2.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(3.0));
        assert!((s.std.unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
