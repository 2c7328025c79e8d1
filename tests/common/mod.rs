//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use battery_sim::battery::BatteryProfile;
use battery_sim::sim::types::{EnergyRecord, PolicyWindows};

/// One hour in seconds.
pub const HOUR: i64 = 3600;

/// 2024-06-10 00:00 Europe/Dublin (UTC+1).
pub const DUBLIN_MIDNIGHT: i64 = 1_717_974_000;

/// Lossless 10 kWh battery, 90/10% bounds, 5 kWh rates, 0.05 kWh boundary.
pub fn lossless_profile() -> BatteryProfile {
    BatteryProfile::new(10.0, 90, 10, 5.0, 5.0, 0, 0, 0.05).expect("valid profile")
}

/// 10 kWh battery with 5% charge and discharge loss.
pub fn lossy_profile() -> BatteryProfile {
    BatteryProfile::new(10.0, 90, 10, 5.0, 5.0, 5, 5, 0.05).expect("valid profile")
}

/// Policy windows from `HH-HH` intervals; empty strings disable.
pub fn windows(grid_shift: &str, discharge_bypass: &str, fit: &str) -> PolicyWindows {
    PolicyWindows {
        grid_shift: grid_shift.parse().expect("grid-shift window"),
        discharge_bypass: discharge_bypass.parse().expect("bypass window"),
        fit: fit.parse().expect("fit window"),
    }
}

/// Hourly records starting at `start`, one per `(hour, import, export)` tuple.
pub fn hourly(start: i64, flows: &[(u8, f64, f64)]) -> Vec<EnergyRecord> {
    flows
        .iter()
        .enumerate()
        .map(|(i, &(hour, import, export))| {
            EnergyRecord::new(start + i as i64 * HOUR, hour, import, export)
        })
        .collect()
}

/// Writes `lines` to `dir/name` joined by newlines.
pub fn write_jsonl(dir: &Path, name: &str, lines: &[&str]) {
    fs::write(dir.join(name), lines.join("\n")).expect("write fixture");
}
