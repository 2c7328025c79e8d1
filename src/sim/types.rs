//! Core simulation types: meter records, carried battery state, policy windows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::window::TimeWindowSet;

/// One sampling interval (normally one hour) of a site's energy flow.
///
/// Serialized with the field names used by the meter exports (`ts`, `hour`,
/// `import`, `export`). Fields this crate does not interpret are kept in
/// [`EnergyRecord::extra`] and written back untouched.
///
/// # Examples
///
/// ```
/// use battery_sim::sim::types::EnergyRecord;
///
/// let rec: EnergyRecord =
///     serde_json::from_str(r#"{"ts": 1700000000, "hour": 22, "import": 0.4, "export": 0, "solar": 0}"#)
///         .unwrap();
/// assert_eq!(rec.hour_of_day, 22);
/// assert_eq!(rec.export_kwh, 0.0);
/// assert!(rec.extra.contains_key("solar"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    /// Interval start as Unix seconds; unique per record.
    #[serde(rename = "ts")]
    pub timestamp: i64,
    /// Local hour of day (0–23), supplied by the loader.
    #[serde(rename = "hour")]
    pub hour_of_day: u8,
    /// Energy drawn from the grid (kWh).
    #[serde(rename = "import")]
    pub import_kwh: f64,
    /// Energy sent to the grid (kWh).
    #[serde(rename = "export")]
    pub export_kwh: f64,
    /// Aggregate consumption mirrored from import, when the source tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed: Option<f64>,
    /// Local calendar day (`YYYY-MM-DD`), used to group output files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// Human-readable local timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Stored energy gained from diverted export (kWh).
    #[serde(default)]
    pub battery_solar_charge: f64,
    /// Stored energy gained from grid-shift charging (kWh).
    #[serde(default)]
    pub battery_grid_charge: f64,
    /// Stored energy released, including forced FIT export (kWh).
    #[serde(default)]
    pub battery_discharge: f64,
    /// Stored energy after this interval (kWh).
    #[serde(default)]
    pub battery_storage: f64,
    /// State of charge after this interval (% of nominal capacity).
    #[serde(default)]
    pub battery_capacity_percent: u32,
    /// Running equivalent full cycles up to and including this interval.
    #[serde(default)]
    pub battery_cycles: f64,

    /// Source fields passed through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnergyRecord {
    /// Creates a bare record with no battery annotations.
    pub fn new(timestamp: i64, hour_of_day: u8, import_kwh: f64, export_kwh: f64) -> Self {
        Self {
            timestamp,
            hour_of_day,
            import_kwh,
            export_kwh,
            consumed: None,
            day: None,
            datetime: None,
            battery_solar_charge: 0.0,
            battery_grid_charge: 0.0,
            battery_discharge: 0.0,
            battery_storage: 0.0,
            battery_capacity_percent: 0,
            battery_cycles: 0.0,
            extra: Map::new(),
        }
    }

    /// Describes why the record cannot be simulated, if it cannot.
    ///
    /// The hour must be 0–23 and both flows finite and non-negative.
    pub fn defect(&self) -> Option<&'static str> {
        if self.hour_of_day > 23 {
            Some("hour outside 0..=23")
        } else if !self.import_kwh.is_finite() || self.import_kwh < 0.0 {
            Some("import is negative or not finite")
        } else if !self.export_kwh.is_finite() || self.export_kwh < 0.0 {
            Some("export is negative or not finite")
        } else {
            None
        }
    }

    /// Mirrors `import` into `consumed` if the record tracks consumption.
    pub(crate) fn resync_consumed(&mut self) {
        if let Some(consumed) = self.consumed.as_mut() {
            *consumed = self.import_kwh;
        }
    }
}

/// The three independent time-of-day policies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PolicyWindows {
    /// Hours during which the battery charges from the grid.
    pub grid_shift: TimeWindowSet,
    /// Hours during which the battery never offsets import.
    pub discharge_bypass: TimeWindowSet,
    /// Hours during which spare discharge capacity is exported.
    pub fit: TimeWindowSet,
}

impl PolicyWindows {
    /// Import-offset discharge is allowed outside both bypass and grid-shift hours.
    pub fn allows_discharge(&self, hour: u8) -> bool {
        !self.discharge_bypass.contains(hour) && !self.grid_shift.contains(hour)
    }
}

/// Battery state carried from one record to the next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationState {
    /// Energy currently held (kWh).
    pub stored_energy_kwh: f64,
    /// Stored energy gained across all records (kWh).
    pub total_charged_kwh: f64,
    /// Stored energy released across all records (kWh).
    pub total_discharged_kwh: f64,
    /// Fractional equivalent full cycles.
    pub total_cycles: f64,
}
