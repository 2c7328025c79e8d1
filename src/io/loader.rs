//! Meter record loading from a directory of JSONL files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::sim::types::EnergyRecord;

/// Inclusive local-date range filter, resolved to Unix seconds.
///
/// The start date covers from 00:00:00 local time and the end date through
/// 23:59:59 local time. Either bound may be open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DateRange {
    /// Resolves optional `YYYYMMDD` bounds in `tz`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidDate`] for malformed dates and
    /// [`LoadError::NonexistentLocalTime`] when the bound falls in a DST gap.
    pub fn parse(start: Option<&str>, end: Option<&str>, tz: Tz) -> Result<Self, LoadError> {
        let start = start
            .map(|s| local_bound(s, (0, 0, 0), tz, true))
            .transpose()?;
        let end = end
            .map(|s| local_bound(s, (23, 59, 59), tz, false))
            .transpose()?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }
}

fn local_bound(
    date: &str,
    (hour, min, sec): (u32, u32, u32),
    tz: Tz,
    earliest: bool,
) -> Result<i64, LoadError> {
    let naive = NaiveDate::parse_from_str(date.trim(), "%Y%m%d")
        .ok()
        .and_then(|day| day.and_hms_opt(hour, min, sec))
        .ok_or_else(|| LoadError::InvalidDate(date.to_string()))?;
    let local = tz.from_local_datetime(&naive);
    let resolved = if earliest {
        local.earliest()
    } else {
        local.latest()
    };
    resolved
        .map(|dt| dt.timestamp())
        .ok_or_else(|| LoadError::NonexistentLocalTime(format!("{date} {naive}")))
}

/// Loads every `*.jsonl` file in `dir` and returns the records in timestamp order.
///
/// Blank lines are skipped. When two records share a timestamp the one read
/// last wins; files are read in name order. Records outside `range` are dropped,
/// as are records with an hour outside 0–23 or a negative or non-finite flow;
/// each of those is logged with its file and line.
///
/// # Errors
///
/// Returns a [`LoadError`] naming the file (and line) that could not be read
/// or parsed.
pub fn load_records(dir: &Path, range: &DateRange) -> Result<Vec<EnergyRecord>, LoadError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LoadError::Io { path, source }
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    paths.sort();

    let mut by_ts: BTreeMap<i64, EnergyRecord> = BTreeMap::new();
    for path in &paths {
        let content = fs::read_to_string(path).map_err(io_err(path))?;
        let mut kept = 0_usize;
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: EnergyRecord =
                serde_json::from_str(line).map_err(|source| LoadError::Json {
                    path: path.clone(),
                    line: idx + 1,
                    source,
                })?;
            if let Some(defect) = record.defect() {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    ts = record.timestamp,
                    defect,
                    "skipping record"
                );
                continue;
            }
            if range.contains(record.timestamp) {
                by_ts.insert(record.timestamp, record);
                kept += 1;
            }
        }
        debug!(path = %path.display(), records = kept, "read file");
    }

    info!(
        dir = %dir.display(),
        files = paths.len(),
        records = by_ts.len(),
        "loaded records"
    );
    Ok(by_ts.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_range_contains_everything() {
        let range = DateRange::default();
        assert!(range.contains(i64::MIN));
        assert!(range.contains(i64::MAX));
    }

    #[test]
    fn range_bounds_are_local_and_inclusive() {
        let tz: Tz = "Europe/Dublin".parse().expect("zone");
        // 2024-06-10 is IST (UTC+1)
        let range = DateRange::parse(Some("20240610"), Some("20240610"), tz).expect("valid range");
        assert_eq!(range.start, Some(1_717_974_000));
        assert_eq!(range.end, Some(1_717_974_000 + 86_399));
        assert!(range.contains(1_717_974_000));
        assert!(!range.contains(1_717_973_999));
        assert!(!range.contains(1_717_974_000 + 86_400));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let err = DateRange::parse(Some("2024-06-10"), None, Tz::UTC).expect_err("must fail");
        assert!(matches!(err, LoadError::InvalidDate(d) if d == "2024-06-10"));
    }
}
