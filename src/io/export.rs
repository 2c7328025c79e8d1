//! Writers for simulated records (per-day JSONL, flat CSV) and the run summary.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::info;

use crate::error::ExportError;
use crate::sim::summary::SimulationSummary;
use crate::sim::types::EnergyRecord;

/// Column header for CSV export.
const HEADER: &str = "ts,hour,import,export,battery_solar_charge,battery_grid_charge,\
                      battery_discharge,battery_storage,battery_capacity_percent,battery_cycles";

/// Local calendar day (`YYYY-MM-DD`) of a Unix timestamp.
pub fn local_day(ts: i64, tz: Tz) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&tz).format("%Y-%m-%d").to_string())
}

/// Rounds every floating-point number in `value` to `places` decimals.
///
/// Integers are left untouched. Halves round away from zero.
pub fn round_floats(value: &mut Value, places: u32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n.as_f64().and_then(|x| {
                let scale = 10_f64.powi(places as i32);
                serde_json::Number::from_f64((x * scale).round() / scale)
            }) {
                *n = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_floats(v, places)),
        Value::Object(map) => map.values_mut().for_each(|v| round_floats(v, places)),
        _ => {}
    }
}

/// Writes records as JSON lines, one object per record.
///
/// # Errors
///
/// Returns an [`ExportError`] if serialization or writing fails.
pub fn write_jsonl<'a>(
    records: impl IntoIterator<Item = &'a EnergyRecord>,
    mut writer: impl Write,
    decimal_places: u32,
) -> Result<(), ExportError> {
    for record in records {
        let mut value = serde_json::to_value(record)?;
        round_floats(&mut value, decimal_places);
        serde_json::to_writer(&mut writer, &value)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Groups records by local day and writes each group to `<odir>/<day>.jsonl`.
///
/// Records carry their own `day` when the source provided one; otherwise it
/// is derived from the timestamp in `tz`. Each file is written in timestamp
/// order. Returns the paths written, which is empty for an empty input.
///
/// # Errors
///
/// Returns an [`ExportError`] if a timestamp has no calendar day or a file
/// cannot be written.
pub fn write_daily_jsonl(
    records: &[EnergyRecord],
    odir: &Path,
    tz: Tz,
    decimal_places: u32,
) -> Result<Vec<PathBuf>, ExportError> {
    let mut days: BTreeMap<String, Vec<&EnergyRecord>> = BTreeMap::new();
    for record in records {
        let day = match &record.day {
            Some(day) => day.clone(),
            None => local_day(record.timestamp, tz)
                .ok_or(ExportError::InvalidTimestamp(record.timestamp))?,
        };
        days.entry(day).or_default().push(record);
    }
    if days.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(odir).map_err(|source| ExportError::Io {
        path: odir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(days.len());
    for (day, mut group) in days {
        group.sort_by_key(|r| r.timestamp);
        let path = odir.join(format!("{day}.jsonl"));
        let file = create(&path)?;
        write_jsonl(group, BufWriter::new(file), decimal_places)?;
        written.push(path);
    }

    info!(dir = %odir.display(), files = written.len(), "wrote daily records");
    Ok(written)
}

/// Exports records to a CSV file at the given path.
///
/// # Errors
///
/// Returns an [`ExportError`] if file creation or writing fails.
pub fn export_csv(records: &[EnergyRecord], path: &Path) -> Result<(), ExportError> {
    let file = create(path)?;
    write_csv(records, BufWriter::new(file))?;
    info!(path = %path.display(), rows = records.len(), "wrote csv");
    Ok(())
}

/// Writes records as CSV to any writer.
///
/// # Errors
///
/// Returns an [`ExportError`] if writing fails.
pub fn write_csv(records: &[EnergyRecord], writer: impl Write) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.timestamp.to_string(),
            r.hour_of_day.to_string(),
            format!("{:.4}", r.import_kwh),
            format!("{:.4}", r.export_kwh),
            format!("{:.4}", r.battery_solar_charge),
            format!("{:.4}", r.battery_grid_charge),
            format!("{:.4}", r.battery_discharge),
            format!("{:.4}", r.battery_storage),
            r.battery_capacity_percent.to_string(),
            format!("{:.4}", r.battery_cycles),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the run summary as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an [`ExportError`] if the file cannot be created or written.
pub fn export_summary_json(summary: &SimulationSummary, path: &Path) -> Result<(), ExportError> {
    let file = create(path)?;
    write_summary_json(summary, BufWriter::new(file))?;
    info!(path = %path.display(), "wrote summary");
    Ok(())
}

/// Writes the run summary as pretty-printed JSON, flushing before returning.
///
/// # Errors
///
/// Returns an [`ExportError`] if serialization, writing, or the final flush fails.
pub fn write_summary_json(
    summary: &SimulationSummary,
    mut writer: impl Write,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
