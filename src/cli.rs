use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser};

use battery_sim::config::ScenarioConfig;

/// Simulate a home battery against recorded grid import/export.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Directory of `*.jsonl` meter records.
    #[clap(long, env = "BATTERY_SIM_IDIR", required_unless_present = "synthetic_days")]
    pub idir: Option<PathBuf>,

    /// Generate this many days of synthetic records instead of reading `--idir`.
    #[clap(long, conflicts_with = "idir")]
    pub synthetic_days: Option<u32>,

    /// Seed for synthetic records.
    #[clap(long, default_value = "42")]
    pub seed: u64,

    /// Directory for per-day simulated records and `summary.json`.
    #[clap(long, env = "BATTERY_SIM_ODIR")]
    pub odir: Option<PathBuf>,

    /// First local day to simulate (`YYYYMMDD`, inclusive).
    #[clap(long)]
    pub start: Option<String>,

    /// Last local day to simulate (`YYYYMMDD`, inclusive).
    #[clap(long)]
    pub end: Option<String>,

    /// TOML scenario file.
    #[clap(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in scenario: baseline, night_shift, export_maximiser.
    #[clap(long)]
    pub preset: Option<String>,

    /// IANA timezone for date ranges and day grouping.
    #[clap(long, env = "BATTERY_SIM_TIMEZONE")]
    pub timezone: Option<String>,

    /// Decimal places kept in written records.
    #[clap(long)]
    pub decimal_places: Option<u32>,

    /// Also write all simulated records to this CSV file.
    #[clap(long)]
    pub csv_out: Option<PathBuf>,

    /// Log every simulated record.
    #[clap(long, short)]
    pub verbose: bool,

    #[clap(flatten)]
    pub battery: BatteryOverrides,

    #[clap(flatten)]
    pub windows: WindowOverrides,
}

/// Battery parameters that replace the scenario's values when given.
#[derive(ClapArgs, Debug, Default)]
pub struct BatteryOverrides {
    /// Nominal capacity in kWh.
    #[clap(long = "battery-capacity")]
    pub capacity_kwh: Option<f64>,

    #[clap(long)]
    pub max_charge_percent: Option<u8>,

    #[clap(long)]
    pub min_charge_percent: Option<u8>,

    /// Charge energy per hour in kWh.
    #[clap(long = "charge-rate")]
    pub charge_rate_kwh: Option<f64>,

    /// Discharge energy per hour in kWh.
    #[clap(long = "discharge-rate")]
    pub discharge_rate_kwh: Option<f64>,

    #[clap(long)]
    pub charge_loss_percent: Option<u8>,

    #[clap(long)]
    pub discharge_loss_percent: Option<u8>,

    /// Minimum hourly export in kWh before solar charging starts.
    #[clap(long = "export-charge-boundary")]
    pub export_charge_boundary_kwh: Option<f64>,
}

/// Policy windows (`HH-HH`) that replace the scenario's values when given.
///
/// An empty string disables the window.
#[derive(ClapArgs, Debug, Default)]
pub struct WindowOverrides {
    #[clap(long = "grid-shift-interval")]
    pub grid_shift: Option<String>,

    #[clap(long = "discharge-bypass-interval")]
    pub discharge_bypass: Option<String>,

    #[clap(long = "fit-interval")]
    pub fit: Option<String>,
}

impl Args {
    /// Copies every command-line override into `scenario`.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        let b = &self.battery;
        let battery = &mut scenario.battery;
        set(&mut battery.capacity_kwh, b.capacity_kwh);
        set(&mut battery.max_charge_percent, b.max_charge_percent);
        set(&mut battery.min_charge_percent, b.min_charge_percent);
        set(&mut battery.charge_rate_kwh, b.charge_rate_kwh);
        set(&mut battery.discharge_rate_kwh, b.discharge_rate_kwh);
        set(&mut battery.charge_loss_percent, b.charge_loss_percent);
        set(&mut battery.discharge_loss_percent, b.discharge_loss_percent);
        set(
            &mut battery.export_charge_boundary_kwh,
            b.export_charge_boundary_kwh,
        );

        let w = &self.windows;
        let windows = &mut scenario.windows;
        for (target, value) in [
            (&mut windows.grid_shift, &w.grid_shift),
            (&mut windows.discharge_bypass, &w.discharge_bypass),
            (&mut windows.fit, &w.fit),
        ] {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        if let Some(tz) = &self.timezone {
            scenario.data.timezone.clone_from(tz);
        }
        set(&mut scenario.data.decimal_places, self.decimal_places);
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
