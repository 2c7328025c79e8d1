//! Battery simulator entry point: CLI wiring, config resolution, and output.

mod cli;

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};

use battery_sim::battery::BatteryProfile;
use battery_sim::config::ScenarioConfig;
use battery_sim::io::export::{export_csv, export_summary_json, write_daily_jsonl};
use battery_sim::io::loader::{DateRange, load_records};
use battery_sim::io::synthetic::SyntheticDay;
use battery_sim::sim::engine::simulate;

use crate::cli::Args;

/// First synthetic day when `--start` is not given.
const SYNTHETIC_START_DATE: &str = "20240601";

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    // --config takes priority, then --preset, then baseline default
    let mut scenario = if let Some(path) = &args.config {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    args.apply_overrides(&mut scenario);

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let profile = BatteryProfile::try_from(&scenario.battery)?;
    let windows = scenario.windows.policy_windows()?;
    let tz = scenario.data.timezone()?;
    let range = DateRange::parse(args.start.as_deref(), args.end.as_deref(), tz)?;

    info!(
        capacity_kwh = profile.capacity_kwh,
        max_charge_kwh = profile.max_charge_capacity_kwh(),
        min_charge_kwh = profile.min_charge_capacity_kwh(),
        grid_shift = %windows.grid_shift,
        discharge_bypass = %windows.discharge_bypass,
        fit = %windows.fit,
        "battery configured"
    );

    let mut records = if let Some(days) = args.synthetic_days {
        let start_ts = match range.start {
            Some(ts) => ts,
            None => DateRange::parse(Some(SYNTHETIC_START_DATE), None, tz)?
                .start
                .unwrap_or_default(),
        };
        let mut records = SyntheticDay::new(args.seed).records(start_ts, days, tz);
        records.retain(|r| range.contains(r.timestamp));
        info!(days, seed = args.seed, records = records.len(), "generated records");
        records
    } else {
        let idir = args
            .idir
            .as_deref()
            .context("either --idir or --synthetic-days is required")?;
        load_records(idir, &range)?
    };

    let summary = simulate(&profile, &windows, &mut records)?;

    if let Some(odir) = &args.odir {
        write_daily_jsonl(&records, odir, tz, scenario.data.decimal_places)?;
        fs::create_dir_all(odir)
            .with_context(|| format!("cannot create \"{}\"", odir.display()))?;
        export_summary_json(&summary, &odir.join("summary.json"))?;
    }
    if let Some(path) = &args.csv_out {
        export_csv(&records, path)?;
    }

    info!(
        stored_kwh = summary.final_stored_energy_kwh,
        capacity_percent = summary.final_capacity_percent,
        cycles = summary.total_cycles,
        "simulation complete"
    );
    println!("{summary}");
    Ok(())
}
