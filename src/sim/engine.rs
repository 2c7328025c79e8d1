//! Battery simulation engine: four ordered energy transfers per record.
//!
//! Each record passes through, in order:
//! 1. solar charge from export headroom,
//! 2. grid-shift charge,
//! 3. import-offset discharge (skipped in bypass and grid-shift hours),
//! 4. forced FIT export of the discharge capacity step 3 left unused.

use tracing::debug;

use crate::battery::BatteryProfile;
use crate::error::SimulationError;

use super::summary::SimulationSummary;
use super::types::{EnergyRecord, PolicyWindows, SimulationState};

/// Outcome of the solar charge transfer.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SolarCharge {
    /// Export diverted into the battery (AC kWh).
    pub diverted_kwh: f64,
    /// Energy that reached storage (kWh).
    pub stored_kwh: f64,
}

/// Outcome of the grid-shift charge transfer.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GridCharge {
    /// Energy that reached storage (kWh).
    pub stored_kwh: f64,
    /// Extra grid import needed to deliver it (AC kWh).
    pub imported_kwh: f64,
}

/// Outcome of the import-offset discharge.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Discharge {
    /// Discharge capacity available this step, taken before withdrawal (kWh).
    pub max_discharge_kwh: f64,
    /// Grid import replaced by battery output (AC kWh).
    pub import_offset_kwh: f64,
    /// Energy withdrawn from storage (kWh).
    pub drawn_kwh: f64,
}

/// Outcome of the forced FIT export.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FitDischarge {
    /// Energy withdrawn from storage (kWh).
    pub drawn_kwh: f64,
    /// Extra export delivered to the grid (AC kWh).
    pub exported_kwh: f64,
}

/// Everything that happened to one record.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub solar: SolarCharge,
    pub grid: Option<GridCharge>,
    pub discharge: Option<Discharge>,
    pub fit: Option<FitDischarge>,
}

impl StepOutcome {
    /// Total energy withdrawn from storage in this step (kWh).
    pub fn discharged_kwh(&self) -> f64 {
        self.discharge.map_or(0.0, |d| d.drawn_kwh) + self.fit.map_or(0.0, |f| f.drawn_kwh)
    }
}

/// Diverts export into the battery when export reaches the charge boundary.
///
/// The diverted amount is capped by both the export and the AC energy needed
/// to fill `min(headroom, charge rate)`; losses apply on the way in.
pub fn solar_charge(profile: &BatteryProfile, stored_kwh: f64, export_kwh: f64) -> SolarCharge {
    if export_kwh < profile.export_charge_boundary_kwh {
        return SolarCharge::default();
    }

    let available_kwh = (profile.max_charge_capacity_kwh() - stored_kwh).max(0.0);
    let max_charge_kwh = available_kwh.min(profile.charge_rate_kwh);
    let ac_charge_kwh = max_charge_kwh * profile.charge_factor_to_ac();
    let diverted_kwh = export_kwh.min(ac_charge_kwh);

    SolarCharge {
        diverted_kwh,
        stored_kwh: diverted_kwh * profile.charge_factor_to_battery(),
    }
}

/// Fills the battery from the grid, up to the charge rate.
pub fn grid_shift_charge(profile: &BatteryProfile, stored_kwh: f64) -> GridCharge {
    let available_kwh = (profile.max_charge_capacity_kwh() - stored_kwh).max(0.0);
    let stored_kwh = available_kwh.min(profile.charge_rate_kwh);

    GridCharge {
        stored_kwh,
        imported_kwh: stored_kwh * profile.charge_factor_to_ac(),
    }
}

/// Offsets grid import from storage above the minimum reserve.
pub fn import_offset_discharge(
    profile: &BatteryProfile,
    stored_kwh: f64,
    import_kwh: f64,
) -> Discharge {
    let available_kwh = (stored_kwh - profile.min_charge_capacity_kwh()).max(0.0);
    let max_discharge_kwh = available_kwh.min(profile.discharge_rate_kwh);
    let ac_discharge_kwh = max_discharge_kwh * profile.discharge_factor_to_ac();
    let import_offset_kwh = import_kwh.min(ac_discharge_kwh);

    Discharge {
        max_discharge_kwh,
        import_offset_kwh,
        drawn_kwh: import_offset_kwh * profile.discharge_factor_to_battery(),
    }
}

/// Exports the discharge capacity that the import offset left unused.
///
/// Because `drawn_kwh <= max_discharge_kwh`, the residual is non-negative and
/// the two withdrawals together never exceed `max_discharge_kwh`.
pub fn fit_discharge(profile: &BatteryProfile, discharge: &Discharge) -> FitDischarge {
    let drawn_kwh = discharge.max_discharge_kwh - discharge.drawn_kwh;

    FitDischarge {
        drawn_kwh,
        exported_kwh: drawn_kwh * profile.discharge_factor_to_ac(),
    }
}

/// Applies one record to the carried state and annotates the record.
///
/// Records must be fed in ascending timestamp order; this function does not
/// check. Use [`BatterySimulator`] for an order-checked loop.
pub fn step(
    state: &mut SimulationState,
    profile: &BatteryProfile,
    windows: &PolicyWindows,
    record: &mut EnergyRecord,
) -> StepOutcome {
    let hour = record.hour_of_day;
    let mut outcome = StepOutcome::default();

    // 1. Solar charge, independent of time windows
    let solar = solar_charge(profile, state.stored_energy_kwh, record.export_kwh);
    state.stored_energy_kwh += solar.stored_kwh;
    state.total_charged_kwh += solar.stored_kwh;
    record.export_kwh -= solar.diverted_kwh;
    outcome.solar = solar;

    // 2. Grid-shift charge
    if windows.grid_shift.contains(hour) {
        let grid = grid_shift_charge(profile, state.stored_energy_kwh);
        state.stored_energy_kwh += grid.stored_kwh;
        state.total_charged_kwh += grid.stored_kwh;
        record.import_kwh += grid.imported_kwh;
        record.resync_consumed();
        outcome.grid = Some(grid);
    }

    // 3. Import-offset discharge, with 4. FIT export nested inside
    if windows.allows_discharge(hour) {
        let discharge =
            import_offset_discharge(profile, state.stored_energy_kwh, record.import_kwh);
        state.stored_energy_kwh -= discharge.drawn_kwh;
        state.total_discharged_kwh += discharge.drawn_kwh;
        record.import_kwh -= discharge.import_offset_kwh;
        record.resync_consumed();
        outcome.discharge = Some(discharge);

        if windows.fit.contains(hour) {
            let fit = fit_discharge(profile, &discharge);
            state.stored_energy_kwh -= fit.drawn_kwh;
            state.total_discharged_kwh += fit.drawn_kwh;
            record.export_kwh += fit.exported_kwh;
            outcome.fit = Some(fit);
        }
    }

    let grid_kwh = outcome.grid.map_or(0.0, |g| g.stored_kwh);
    let offset_kwh = outcome.discharge.map_or(0.0, |d| d.import_offset_kwh);
    let fit_kwh = outcome.fit.map_or(0.0, |f| f.drawn_kwh);
    let max_capacity_kwh = profile.max_charge_capacity_kwh();
    if max_capacity_kwh > 0.0 {
        state.total_cycles +=
            (solar.stored_kwh + grid_kwh + offset_kwh + fit_kwh) / (max_capacity_kwh * 2.0);
    }

    record.battery_solar_charge = solar.stored_kwh;
    record.battery_grid_charge = grid_kwh;
    record.battery_discharge = outcome.discharged_kwh();
    record.battery_storage = state.stored_energy_kwh;
    record.battery_capacity_percent = profile.capacity_percent(state.stored_energy_kwh);
    record.battery_cycles = state.total_cycles;

    outcome
}

/// Order-checked simulation loop over a battery profile and its policy windows.
///
/// Owns the only mutable [`SimulationState`] of a run. Records are visited
/// strictly by ascending timestamp; a record at or before the previous one
/// is rejected and leaves the state untouched.
#[derive(Debug, Clone)]
pub struct BatterySimulator {
    profile: BatteryProfile,
    windows: PolicyWindows,
    state: SimulationState,
    summary: SimulationSummary,
    last_timestamp: Option<i64>,
}

impl BatterySimulator {
    /// Creates a simulator with an empty battery.
    pub fn new(profile: BatteryProfile, windows: PolicyWindows) -> Self {
        Self {
            profile,
            windows,
            state: SimulationState::default(),
            summary: SimulationSummary::default(),
            last_timestamp: None,
        }
    }

    pub fn profile(&self) -> &BatteryProfile {
        &self.profile
    }

    pub fn windows(&self) -> &PolicyWindows {
        &self.windows
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Processes the next record in time order.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::OrderingViolation`] if the record's timestamp
    /// is not strictly after the previous record's.
    pub fn step(&mut self, record: &mut EnergyRecord) -> Result<StepOutcome, SimulationError> {
        if let Some(previous) = self.last_timestamp.filter(|&p| record.timestamp <= p) {
            return Err(SimulationError::OrderingViolation {
                previous,
                current: record.timestamp,
            });
        }
        self.last_timestamp = Some(record.timestamp);

        let import_before_kwh = record.import_kwh;
        let export_before_kwh = record.export_kwh;
        let outcome = step(&mut self.state, &self.profile, &self.windows, record);
        self.summary
            .record_step(&outcome, import_before_kwh, export_before_kwh, record);

        debug!(
            ts = record.timestamp,
            datetime = record.datetime.as_deref().unwrap_or_default(),
            solar_charge_kwh = record.battery_solar_charge,
            grid_charge_kwh = record.battery_grid_charge,
            discharge_kwh = record.battery_discharge,
            storage_kwh = record.battery_storage,
            soc_percent = record.battery_capacity_percent,
            "step"
        );

        Ok(outcome)
    }

    /// Processes a slice already sorted by timestamp.
    ///
    /// # Errors
    ///
    /// Stops at the first out-of-order record; earlier records stay annotated.
    pub fn run(&mut self, records: &mut [EnergyRecord]) -> Result<(), SimulationError> {
        for record in records.iter_mut() {
            self.step(record)?;
        }
        Ok(())
    }

    /// Totals so far, including the final battery state.
    pub fn summary(&self) -> SimulationSummary {
        self.summary.finish(&self.state, &self.profile)
    }
}

/// Sorts records by timestamp, then runs a fresh simulator over them.
///
/// # Errors
///
/// Returns [`SimulationError::OrderingViolation`] on duplicate timestamps.
pub fn simulate(
    profile: &BatteryProfile,
    windows: &PolicyWindows,
    records: &mut [EnergyRecord],
) -> Result<SimulationSummary, SimulationError> {
    records.sort_by_key(|r| r.timestamp);
    let mut simulator = BatterySimulator::new(profile.clone(), *windows);
    simulator.run(records)?;
    Ok(simulator.summary())
}
