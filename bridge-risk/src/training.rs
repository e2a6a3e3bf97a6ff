//! Training data preparation from probe-tick exports.
//!
//! Probe ticks arrive as newline-delimited JSON, one record per bridge per
//! minute. Rows are built with the same feature layout and normalisation the
//! serving path uses (see [`crate::features`]), labelled with the lift
//! state `horizon` ticks later, and written as CSV.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::BridgeId;
use crate::domain::time::{day_of_week_encoding, minute_of_day_encoding};
use crate::features::{
    BridgeCatalog, FEATURE_COUNT, FEATURE_NAMES, FeatureVector, MISSING, cross_rate,
    normalize_detour_delta, normalize_gate_anomaly, normalize_via_penalty,
};

const SHORT_WINDOW_TICKS: usize = 5;
const LONG_WINDOW_TICKS: usize = 30;

/// Error from loading or exporting training data.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Every line of the input was blank or malformed
    #[error("no valid probe ticks in input")]
    NoValidRecords,

    #[error("validation fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),
}

fn default_version() -> u32 {
    1
}

fn default_gate_anom() -> f64 {
    1.0
}

/// One per-minute observation of a bridge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbeTick {
    #[serde(default = "default_version")]
    pub v: u32,
    pub ts_utc: DateTime<Utc>,
    pub bridge_id: u32,
    #[serde(default)]
    pub cross_k: Option<f64>,
    #[serde(default)]
    pub cross_n: Option<f64>,
    #[serde(default)]
    pub via_routable: bool,
    #[serde(default)]
    pub via_penalty_sec: f64,
    #[serde(default = "default_gate_anom")]
    pub gate_anom: f64,
    #[serde(default)]
    pub alternates_total: u32,
    #[serde(default)]
    pub alternates_avoid: u32,
    /// 1 while the bridge is lifting for vessels and closed to road traffic.
    pub open_label: u8,
    #[serde(default)]
    pub detour_delta: Option<f64>,
    #[serde(default)]
    pub detour_frac: Option<f64>,
}

impl ProbeTick {
    pub fn bridge(&self) -> BridgeId {
        BridgeId::new(self.bridge_id.to_string())
    }

    /// Observation time on the engine's naive clock.
    pub fn local_time(&self) -> NaiveDateTime {
        self.ts_utc.naive_utc()
    }

    pub fn is_lifting(&self) -> bool {
        self.open_label != 0
    }
}

/// Parse probe ticks from NDJSON, skipping lines that do not parse.
///
/// # Errors
///
/// Returns `TrainingError::Io` if reading fails and
/// `TrainingError::NoValidRecords` if no line parsed.
pub fn load_ndjson(reader: impl BufRead) -> Result<Vec<ProbeTick>, TrainingError> {
    let mut ticks = Vec::new();
    let mut skipped = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ProbeTick>(line) {
            Ok(tick) => ticks.push(tick),
            Err(e) => {
                warn!(line = i + 1, error = %e, "Skipping malformed probe tick");
                skipped += 1;
            }
        }
    }

    if ticks.is_empty() {
        return Err(TrainingError::NoValidRecords);
    }
    info!(records = ticks.len(), skipped, "Loaded probe ticks");
    Ok(ticks)
}

/// Catalog over the bridges seen in `ticks`, in numeric order.
pub fn catalog_from_ticks(ticks: &[ProbeTick]) -> BridgeCatalog {
    let mut ids: Vec<u32> = ticks.iter().map(|t| t.bridge_id).collect();
    ids.sort_unstable();
    ids.dedup();
    BridgeCatalog::from_ordered(ids.into_iter().map(|id| BridgeId::new(id.to_string())))
}

/// A labelled feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub observed_at: NaiveDateTime,
    pub features: FeatureVector,
    /// Lift label `horizon` ticks after `observed_at`, 0 past the end of the data.
    pub target: u8,
}

fn rolling_mean(labels: &[u8], end: usize, window: usize) -> f64 {
    let start = (end + 1).saturating_sub(window);
    let slice = &labels[start..=end];
    slice.iter().map(|&l| f64::from(l)).sum::<f64>() / slice.len() as f64
}

/// Build one row per tick for a single horizon.
///
/// Ticks are grouped by bridge and ordered by time within each group. Rows
/// come out in that (bridge, time) order.
pub fn build_training_rows(
    ticks: &[ProbeTick],
    horizon: u32,
    catalog: &BridgeCatalog,
) -> Vec<TrainingRow> {
    let mut groups: HashMap<u32, Vec<&ProbeTick>> = HashMap::new();
    for tick in ticks {
        groups.entry(tick.bridge_id).or_default().push(tick);
    }
    let mut bridge_ids: Vec<u32> = groups.keys().copied().collect();
    bridge_ids.sort_unstable();

    let shift = horizon as usize;
    let mut rows = Vec::with_capacity(ticks.len());

    for bridge_id in bridge_ids {
        let Some(mut group) = groups.remove(&bridge_id) else {
            continue;
        };
        group.sort_by_key(|t| t.ts_utc);
        let labels: Vec<u8> = group.iter().map(|t| u8::from(t.is_lifting())).collect();
        let bridge_index = catalog
            .index_of(&BridgeId::new(bridge_id.to_string()))
            .map_or(MISSING, |i| i as f64);

        for (i, tick) in group.iter().enumerate() {
            let at = tick.local_time();
            let (min_sin, min_cos) = minute_of_day_encoding(at);
            let (dow_sin, dow_cos) = day_of_week_encoding(at);

            let values: [f64; FEATURE_COUNT] = [
                bridge_index,
                f64::from(horizon),
                min_sin,
                min_cos,
                dow_sin,
                dow_cos,
                rolling_mean(&labels, i, SHORT_WINDOW_TICKS),
                rolling_mean(&labels, i, LONG_WINDOW_TICKS),
                normalize_detour_delta(tick.detour_delta.unwrap_or(0.0)),
                cross_rate(tick.cross_k, tick.cross_n),
                if tick.via_routable { 1.0 } else { 0.0 },
                normalize_via_penalty(tick.via_penalty_sec),
                normalize_gate_anomaly(tick.gate_anom),
                tick.detour_frac.unwrap_or(0.0),
            ];

            rows.push(TrainingRow {
                observed_at: at,
                features: FeatureVector::new(values),
                target: labels.get(i + shift).copied().unwrap_or(0),
            });
        }
    }

    rows
}

/// Split rows by time: the earliest `1 - validation_fraction` share trains,
/// the rest validates.
///
/// # Errors
///
/// Returns `TrainingError::InvalidFraction` unless the fraction is in [0, 1].
pub fn time_based_split(
    mut rows: Vec<TrainingRow>,
    validation_fraction: f64,
) -> Result<(Vec<TrainingRow>, Vec<TrainingRow>), TrainingError> {
    if !(0.0..=1.0).contains(&validation_fraction) {
        return Err(TrainingError::InvalidFraction(validation_fraction));
    }
    rows.sort_by_key(|r| r.observed_at);
    let split = (rows.len() as f64 * (1.0 - validation_fraction)) as usize;
    let validation = rows.split_off(split.min(rows.len()));
    Ok((rows, validation))
}

/// Write rows as CSV with the feature names and a `target` column.
pub fn write_csv<W: Write>(writer: W, rows: &[TrainingRow]) -> Result<(), TrainingError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(FEATURE_NAMES.iter().copied().chain(["target"]))?;
    for row in rows {
        csv.write_record(
            row.features
                .as_slice()
                .iter()
                .map(|x| x.to_string())
                .chain([row.target.to_string()]),
        )?;
    }
    csv.flush()?;
    Ok(())
}

fn write_csv_file(path: &Path, rows: &[TrainingRow]) -> Result<(), TrainingError> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), rows)
}

fn sibling(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "training_data".to_string());
    output.with_file_name(format!("{stem}{suffix}.csv"))
}

/// Write `<stem>_horizon_<h>.csv` and its `_train` / `_val` splits for each
/// horizon, next to `output`. Returns the written paths.
pub fn write_horizon_files(
    ticks: &[ProbeTick],
    horizons: &[u32],
    output: &Path,
    validation_fraction: f64,
) -> Result<Vec<PathBuf>, TrainingError> {
    if !(0.0..=1.0).contains(&validation_fraction) {
        return Err(TrainingError::InvalidFraction(validation_fraction));
    }

    let catalog = catalog_from_ticks(ticks);
    let mut written = Vec::with_capacity(horizons.len() * 3);

    for &horizon in horizons {
        let rows = build_training_rows(ticks, horizon, &catalog);

        let full = sibling(output, &format!("_horizon_{horizon}"));
        write_csv_file(&full, &rows)?;

        let (train, validation) = time_based_split(rows, validation_fraction)?;
        let train_path = sibling(output, &format!("_horizon_{horizon}_train"));
        let val_path = sibling(output, &format!("_horizon_{horizon}_val"));
        write_csv_file(&train_path, &train)?;
        write_csv_file(&val_path, &validation)?;

        info!(
            horizon,
            train = train.len(),
            validation = validation.len(),
            path = %full.display(),
            "Wrote training data"
        );
        written.extend([full, train_path, val_path]);
    }

    Ok(written)
}
