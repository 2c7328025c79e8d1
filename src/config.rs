//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::sim::types::PolicyWindows;
use crate::sim::window::TimeWindowSet;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery physical parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Time-of-day policy windows.
    #[serde(default)]
    pub windows: WindowsConfig,
    /// Record interpretation and output formatting.
    #[serde(default)]
    pub data: DataConfig,
}

/// Battery physical parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Nominal capacity (kWh).
    pub capacity_kwh: f64,
    /// Upper state-of-charge bound (1–100).
    pub max_charge_percent: u8,
    /// Lower state-of-charge bound (1–100).
    pub min_charge_percent: u8,
    /// Charge energy per step (kWh).
    pub charge_rate_kwh: f64,
    /// Discharge energy per step (kWh).
    pub discharge_rate_kwh: f64,
    /// Charge conversion loss (0–100).
    pub charge_loss_percent: u8,
    /// Discharge conversion loss (0–100).
    pub discharge_loss_percent: u8,
    /// Minimum export before solar charging activates (kWh).
    pub export_charge_boundary_kwh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 10.0,
            max_charge_percent: 100,
            min_charge_percent: 10,
            charge_rate_kwh: 5.0,
            discharge_rate_kwh: 5.0,
            charge_loss_percent: 0,
            discharge_loss_percent: 0,
            export_charge_boundary_kwh: 0.05,
        }
    }
}

impl BatteryConfig {
    /// Validates all battery fields and returns a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !self.capacity_kwh.is_finite() || self.capacity_kwh <= 0.0 {
            errors.push(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }
        for (field, percent) in [
            ("battery.max_charge_percent", self.max_charge_percent),
            ("battery.min_charge_percent", self.min_charge_percent),
        ] {
            if !(1..=100).contains(&percent) {
                errors.push(ConfigError::new(field, "must be in [1, 100]"));
            }
        }
        if self.min_charge_percent >= self.max_charge_percent {
            errors.push(ConfigError::new(
                "battery.min_charge_percent",
                "must be < battery.max_charge_percent",
            ));
        }
        for (field, rate) in [
            ("battery.charge_rate_kwh", self.charge_rate_kwh),
            ("battery.discharge_rate_kwh", self.discharge_rate_kwh),
            (
                "battery.export_charge_boundary_kwh",
                self.export_charge_boundary_kwh,
            ),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        for (field, loss) in [
            ("battery.charge_loss_percent", self.charge_loss_percent),
            ("battery.discharge_loss_percent", self.discharge_loss_percent),
        ] {
            if loss > 100 {
                errors.push(ConfigError::new(field, "must be in [0, 100]"));
            }
        }

        errors
    }
}

/// Time-of-day policy windows as `HH-HH` strings; absent or empty disables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowsConfig {
    /// Hours during which the battery charges from the grid.
    pub grid_shift: Option<String>,
    /// Hours during which the battery never offsets import.
    pub discharge_bypass: Option<String>,
    /// Hours during which spare discharge capacity is exported.
    pub fit: Option<String>,
}

impl WindowsConfig {
    /// Parses all three windows.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first malformed window.
    pub fn policy_windows(&self) -> Result<PolicyWindows, ConfigError> {
        let parse = |field: &str, interval: &Option<String>| {
            TimeWindowSet::parse_optional(interval.as_deref())
                .map_err(|e| ConfigError::new(format!("windows.{field}"), e.to_string()))
        };
        Ok(PolicyWindows {
            grid_shift: parse("grid_shift", &self.grid_shift)?,
            discharge_bypass: parse("discharge_bypass", &self.discharge_bypass)?,
            fit: parse("fit", &self.fit)?,
        })
    }

    fn validate(&self) -> Vec<ConfigError> {
        [
            ("grid_shift", &self.grid_shift),
            ("discharge_bypass", &self.discharge_bypass),
            ("fit", &self.fit),
        ]
        .into_iter()
        .filter_map(|(field, interval)| {
            TimeWindowSet::parse_optional(interval.as_deref())
                .err()
                .map(|e| ConfigError::new(format!("windows.{field}"), e.to_string()))
        })
        .collect()
    }
}

/// Record interpretation and output formatting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// IANA timezone used for date ranges and day grouping.
    pub timezone: String,
    /// Decimal places kept in written records.
    pub decimal_places: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Dublin".to_string(),
            decimal_places: 4,
        }
    }
}

impl DataConfig {
    /// Largest supported rounding precision.
    pub const MAX_DECIMAL_PLACES: u32 = 12;

    /// Resolves the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the name is not a known IANA zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::new(
                "data.timezone",
                format!("unknown timezone \"{}\"", self.timezone),
            )
        })
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 10 kWh, lossless, no policy windows.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the night-shift preset: lossy battery topped up from the grid overnight.
    pub fn night_shift() -> Self {
        Self {
            battery: BatteryConfig {
                max_charge_percent: 95,
                charge_rate_kwh: 3.3,
                discharge_rate_kwh: 3.3,
                charge_loss_percent: 5,
                discharge_loss_percent: 5,
                ..BatteryConfig::default()
            },
            windows: WindowsConfig {
                grid_shift: Some("02-05".to_string()),
                ..WindowsConfig::default()
            },
            data: DataConfig::default(),
        }
    }

    /// Returns the export-maximiser preset: hold charge by day, sell it in the evening.
    pub fn export_maximiser() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_kwh: 15.0,
                charge_loss_percent: 5,
                discharge_loss_percent: 5,
                ..BatteryConfig::default()
            },
            windows: WindowsConfig {
                grid_shift: Some("02-05".to_string()),
                discharge_bypass: Some("08-17".to_string()),
                fit: Some("17-19".to_string()),
            },
            data: DataConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "night_shift", "export_maximiser"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "night_shift" => Ok(Self::night_shift()),
            "export_maximiser" => Ok(Self::export_maximiser()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.battery.validate();
        errors.extend(self.windows.validate());

        if let Err(e) = self.data.timezone() {
            errors.push(e);
        }
        if self.data.decimal_places > DataConfig::MAX_DECIMAL_PLACES {
            errors.push(ConfigError::new(
                "data.decimal_places",
                format!("must be <= {}", DataConfig::MAX_DECIMAL_PLACES),
            ));
        }

        errors
    }
}
