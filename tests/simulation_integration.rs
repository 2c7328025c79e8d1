//! Integration tests for full simulation runs.

mod common;

use approx::assert_abs_diff_eq;

use battery_sim::battery::BatteryProfile;
use battery_sim::config::ScenarioConfig;
use battery_sim::io::synthetic::SyntheticDay;
use battery_sim::sim::engine::{BatterySimulator, simulate};
use battery_sim::sim::types::{EnergyRecord, PolicyWindows};

use common::{DUBLIN_MIDNIGHT, HOUR};

#[test]
fn solar_day_then_evening_discharge() {
    let profile = common::lossless_profile();
    let mut records = common::hourly(0, &[(10, 2.0, 6.0), (20, 3.0, 0.0)]);

    let summary = simulate(&profile, &PolicyWindows::default(), &mut records).expect("ordered");

    // Record 1 charges 5 kWh, then offsets its own 2 kWh import
    let r1 = &records[0];
    assert_abs_diff_eq!(r1.battery_solar_charge, 5.0);
    assert_abs_diff_eq!(r1.export_kwh, 1.0);
    assert_abs_diff_eq!(r1.import_kwh, 0.0);
    assert_abs_diff_eq!(r1.battery_discharge, 2.0);
    assert_abs_diff_eq!(r1.battery_storage, 3.0);
    assert_eq!(r1.battery_capacity_percent, 30);

    // Record 2 is limited by the 1 kWh reserve
    let r2 = &records[1];
    assert_abs_diff_eq!(r2.battery_discharge, 2.0);
    assert_abs_diff_eq!(r2.import_kwh, 1.0);
    assert_abs_diff_eq!(r2.battery_storage, 1.0);
    assert_eq!(r2.battery_capacity_percent, 10);

    assert_abs_diff_eq!(summary.total_charged_kwh, 5.0);
    assert_abs_diff_eq!(summary.total_discharged_kwh, 4.0);
    assert_abs_diff_eq!(summary.total_cycles, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(r2.battery_cycles, 0.5, epsilon = 1e-12);
}

#[test]
fn export_only_morning_leaves_five_for_the_evening() {
    let profile = common::lossless_profile();
    let mut records = common::hourly(0, &[(10, 0.0, 6.0), (20, 3.0, 0.0)]);

    simulate(&profile, &PolicyWindows::default(), &mut records).expect("ordered");

    assert_abs_diff_eq!(records[0].battery_storage, 5.0);
    assert_abs_diff_eq!(records[0].export_kwh, 1.0);
    assert_abs_diff_eq!(records[1].battery_discharge, 3.0);
    assert_abs_diff_eq!(records[1].import_kwh, 0.0);
    assert_abs_diff_eq!(records[1].battery_storage, 2.0);
}

#[test]
fn overnight_grid_shift_fills_then_covers_the_day() {
    let profile = common::lossy_profile();
    let windows = common::windows("02-05", "", "");
    let flows: Vec<(u8, f64, f64)> = (0..24).map(|h| (h, 0.5, 0.0)).collect();
    let mut records = common::hourly(0, &flows);

    simulate(&profile, &windows, &mut records).expect("ordered");

    // Charges 5 then 4 kWh; the third hour finds the battery full
    assert_abs_diff_eq!(records[2].battery_grid_charge, 5.0);
    assert_abs_diff_eq!(records[2].import_kwh, 0.5 + 5.0 * 1.05, epsilon = 1e-9);
    assert_abs_diff_eq!(records[3].battery_grid_charge, 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(records[4].battery_grid_charge, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(records[4].battery_storage, 9.0, epsilon = 1e-9);
    for r in &records[2..5] {
        assert_eq!(r.battery_discharge, 0.0);
    }

    // From 05:00 every hour's import is offset, drawing 5% extra from storage
    assert_abs_diff_eq!(records[5].import_kwh, 0.0);
    assert_abs_diff_eq!(records[5].battery_discharge, 0.525, epsilon = 1e-9);
    assert_abs_diff_eq!(records[5].battery_storage, 9.0 - 0.525, epsilon = 1e-9);
}

#[test]
fn fit_hour_sells_down_to_the_discharge_rate() {
    let profile = common::lossless_profile();
    let windows = common::windows("", "", "17-19");
    let mut records = common::hourly(0, &[(12, 0.0, 9.0), (13, 0.0, 9.0), (17, 0.5, 0.0)]);

    let summary = simulate(&profile, &windows, &mut records).expect("ordered");

    let evening = &records[2];
    assert_abs_diff_eq!(evening.import_kwh, 0.0);
    assert_abs_diff_eq!(evening.export_kwh, 4.5, epsilon = 1e-12);
    assert_abs_diff_eq!(evening.battery_discharge, 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(evening.battery_storage, 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(summary.fit_discharged_kwh, 4.5, epsilon = 1e-12);
}

#[test]
fn bypass_holds_charge_until_the_window_ends() {
    let profile = common::lossless_profile();
    let windows = common::windows("", "08-17", "");
    let mut records = common::hourly(0, &[(9, 0.0, 6.0), (12, 2.0, 0.0), (18, 2.0, 0.0)]);

    simulate(&profile, &windows, &mut records).expect("ordered");

    assert_abs_diff_eq!(records[1].import_kwh, 2.0);
    assert_abs_diff_eq!(records[1].battery_storage, 5.0);
    assert_abs_diff_eq!(records[2].import_kwh, 0.0);
    assert_abs_diff_eq!(records[2].battery_storage, 3.0);
}

#[test]
fn running_step_by_step_matches_batch() {
    let profile = common::lossy_profile();
    let windows = common::windows("02-05", "", "17-19");
    let mut batch = SyntheticDay::new(9).records(DUBLIN_MIDNIGHT, 2, chrono_tz::Tz::UTC);
    let mut stepped = batch.clone();

    let batch_summary = simulate(&profile, &windows, &mut batch).expect("ordered");

    let mut sim = BatterySimulator::new(profile, windows);
    for record in &mut stepped {
        sim.step(record).expect("ordered");
    }

    assert_eq!(batch, stepped);
    assert_eq!(batch_summary, sim.summary());
}

#[test]
fn presets_respect_storage_bounds_over_a_week() {
    for name in ScenarioConfig::PRESETS {
        let scenario = ScenarioConfig::from_preset(name).expect("preset");
        let profile = BatteryProfile::try_from(&scenario.battery).expect("valid battery");
        let windows = scenario.windows.policy_windows().expect("valid windows");
        let tz = scenario.data.timezone().expect("valid timezone");
        let mut records: Vec<EnergyRecord> = SyntheticDay::new(1).records(DUBLIN_MIDNIGHT, 7, tz);

        let summary = simulate(&profile, &windows, &mut records).expect("ordered");

        let max = profile.max_charge_capacity_kwh();
        let min = profile.min_charge_capacity_kwh();
        let mut previous = 0.0_f64;
        for r in &records {
            assert!(r.battery_storage <= max + 1e-9, "{name}: above max at {}", r.timestamp);
            assert!(
                r.battery_storage >= previous.min(min) - 1e-9,
                "{name}: drained below reserve at {}",
                r.timestamp
            );
            assert!(r.import_kwh >= -1e-9 && r.export_kwh >= -1e-9);
            if windows.discharge_bypass.contains(r.hour_of_day)
                || windows.grid_shift.contains(r.hour_of_day)
            {
                assert_eq!(r.battery_discharge, 0.0, "{name}: discharged in a held hour");
            }
            previous = r.battery_storage;
        }

        assert_abs_diff_eq!(
            summary.final_stored_energy_kwh,
            summary.total_charged_kwh - summary.total_discharged_kwh,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            summary.total_charged_kwh,
            summary.solar_charged_kwh + summary.grid_charged_kwh,
            epsilon = 1e-9
        );
    }
}

#[test]
fn duplicate_timestamps_abort_the_run() {
    let mut records = vec![
        EnergyRecord::new(5 * HOUR, 5, 1.0, 0.0),
        EnergyRecord::new(5 * HOUR, 5, 1.0, 0.0),
    ];
    let result = simulate(
        &common::lossless_profile(),
        &PolicyWindows::default(),
        &mut records,
    );
    assert!(result.is_err());
}
