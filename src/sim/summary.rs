//! Run totals accumulated alongside the simulation loop.

use std::fmt;

use serde::Serialize;

use crate::battery::BatteryProfile;

use super::engine::StepOutcome;
use super::types::{EnergyRecord, SimulationState};

/// Aggregate energy flows and final battery state for a complete run.
///
/// Import and export are tracked both as read from the source records and as
/// left after the battery acted, so the grid effect of the battery is the
/// difference between the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Number of records processed.
    pub records: usize,
    /// Stored energy after the last record (kWh).
    pub final_stored_energy_kwh: f64,
    /// State of charge after the last record (% of nominal capacity).
    pub final_capacity_percent: u32,
    /// Stored energy gained (kWh).
    pub total_charged_kwh: f64,
    /// Part of `total_charged_kwh` that came from diverted export (kWh).
    pub solar_charged_kwh: f64,
    /// Part of `total_charged_kwh` that came from grid-shift charging (kWh).
    pub grid_charged_kwh: f64,
    /// Stored energy released (kWh).
    pub total_discharged_kwh: f64,
    /// Part of `total_discharged_kwh` forced out in FIT hours (kWh).
    pub fit_discharged_kwh: f64,
    /// Equivalent full cycles.
    pub total_cycles: f64,
    /// Grid import without the battery (kWh).
    pub import_before_kwh: f64,
    /// Grid import with the battery (kWh).
    pub import_after_kwh: f64,
    /// Grid export without the battery (kWh).
    pub export_before_kwh: f64,
    /// Grid export with the battery (kWh).
    pub export_after_kwh: f64,
}

impl SimulationSummary {
    pub(crate) fn record_step(
        &mut self,
        outcome: &StepOutcome,
        import_before_kwh: f64,
        export_before_kwh: f64,
        record: &EnergyRecord,
    ) {
        self.records += 1;
        self.solar_charged_kwh += outcome.solar.stored_kwh;
        self.grid_charged_kwh += outcome.grid.map_or(0.0, |g| g.stored_kwh);
        self.fit_discharged_kwh += outcome.fit.map_or(0.0, |f| f.drawn_kwh);
        self.import_before_kwh += import_before_kwh;
        self.export_before_kwh += export_before_kwh;
        self.import_after_kwh += record.import_kwh;
        self.export_after_kwh += record.export_kwh;
    }

    /// Copies the carried battery state into a finished summary.
    pub(crate) fn finish(&self, state: &SimulationState, profile: &BatteryProfile) -> Self {
        Self {
            final_stored_energy_kwh: state.stored_energy_kwh,
            final_capacity_percent: profile.capacity_percent(state.stored_energy_kwh),
            total_charged_kwh: state.total_charged_kwh,
            total_discharged_kwh: state.total_discharged_kwh,
            total_cycles: state.total_cycles,
            ..self.clone()
        }
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Battery Summary ---")?;
        writeln!(f, "Records:               {}", self.records)?;
        writeln!(
            f,
            "Final storage:         {:.2} kWh ({}%)",
            self.final_stored_energy_kwh, self.final_capacity_percent
        )?;
        writeln!(
            f,
            "Total charged:         {:.2} kWh (solar {:.2}, grid {:.2})",
            self.total_charged_kwh, self.solar_charged_kwh, self.grid_charged_kwh
        )?;
        writeln!(
            f,
            "Total discharged:      {:.2} kWh (FIT {:.2})",
            self.total_discharged_kwh, self.fit_discharged_kwh
        )?;
        writeln!(f, "Equivalent cycles:     {:.2}", self.total_cycles)?;
        writeln!(
            f,
            "Grid import:           {:.2} -> {:.2} kWh",
            self.import_before_kwh, self.import_after_kwh
        )?;
        write!(
            f,
            "Grid export:           {:.2} -> {:.2} kWh",
            self.export_before_kwh, self.export_after_kwh
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::sim::engine::BatterySimulator;
    use crate::sim::types::PolicyWindows;

    fn run(records: &mut [EnergyRecord]) -> SimulationSummary {
        let profile =
            BatteryProfile::new(10.0, 90, 10, 5.0, 5.0, 0, 0, 0.05).expect("valid profile");
        let mut sim = BatterySimulator::new(profile, PolicyWindows::default());
        sim.run(records).expect("ordered records");
        sim.summary()
    }

    #[test]
    fn empty_run_is_all_zero() {
        assert_eq!(run(&mut []), SimulationSummary::default());
    }

    #[test]
    fn totals_match_record_annotations() {
        let mut records = vec![
            EnergyRecord::new(0, 11, 0.0, 4.0),
            EnergyRecord::new(3600, 12, 0.0, 2.0),
            EnergyRecord::new(7200, 19, 2.5, 0.0),
        ];
        let summary = run(&mut records);

        let solar: f64 = records.iter().map(|r| r.battery_solar_charge).sum();
        let discharged: f64 = records.iter().map(|r| r.battery_discharge).sum();
        assert_eq!(summary.records, 3);
        assert_abs_diff_eq!(summary.solar_charged_kwh, solar);
        assert_abs_diff_eq!(summary.total_charged_kwh, 6.0);
        assert_abs_diff_eq!(summary.total_discharged_kwh, discharged);
        assert_abs_diff_eq!(summary.import_before_kwh, 2.5);
        assert_abs_diff_eq!(summary.import_after_kwh, 0.0);
        assert_abs_diff_eq!(summary.export_before_kwh, 6.0);
        assert_abs_diff_eq!(summary.export_after_kwh, 0.0);
        assert_abs_diff_eq!(summary.final_stored_energy_kwh, 3.5);
        assert_eq!(summary.final_capacity_percent, 35);
        assert_abs_diff_eq!(summary.total_cycles, records[2].battery_cycles);
    }

    #[test]
    fn display_lists_storage_and_grid_flows() {
        let mut records = vec![EnergyRecord::new(0, 11, 0.0, 4.0)];
        let text = run(&mut records).to_string();
        assert!(text.starts_with("--- Battery Summary ---"));
        assert!(text.contains("Final storage:         4.00 kWh (40%)"));
        assert!(text.contains("Grid export:           4.00 -> 0.00 kWh"));
    }
}
