use crate::config::BatteryConfig;
use crate::error::ConfigError;

/// Physical and policy parameters of a home battery.
///
/// `BatteryProfile` is validated once on construction and read-only for the
/// whole simulation run. All energy quantities are per sampling interval
/// (normally one hour), so charge and discharge rates are in kWh per step.
///
/// # Loss Convention
/// - AC → battery multiplies by `(100 - loss) / 100`
/// - battery → AC-equivalent multiplies by `1 + loss / 100`
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryProfile {
    /// Nominal capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// Upper state-of-charge bound (1..=100).
    pub max_charge_percent: u8,

    /// Lower state-of-charge bound reserved from discharge (1..=100).
    pub min_charge_percent: u8,

    /// Energy the battery can absorb in one step (kWh).
    pub charge_rate_kwh: f64,

    /// Energy the battery can release in one step (kWh).
    pub discharge_rate_kwh: f64,

    /// Conversion loss when charging (0..=100 percent).
    pub charge_loss_percent: u8,

    /// Conversion loss when discharging (0..=100 percent).
    pub discharge_loss_percent: u8,

    /// Minimum export in a step before solar charging kicks in (kWh).
    pub export_charge_boundary_kwh: f64,
}

impl BatteryProfile {
    /// Creates a validated battery profile.
    ///
    /// # Arguments
    ///
    /// * `capacity_kwh` - Nominal capacity in kWh (must be > 0)
    /// * `max_charge_percent` - Upper SoC bound, 1..=100
    /// * `min_charge_percent` - Lower SoC bound, 1..=100 and below the upper bound
    /// * `charge_rate_kwh` - Charge energy per step (>= 0)
    /// * `discharge_rate_kwh` - Discharge energy per step (>= 0)
    /// * `charge_loss_percent` - Charge conversion loss, 0..=100
    /// * `discharge_loss_percent` - Discharge conversion loss, 0..=100
    /// * `export_charge_boundary_kwh` - Export threshold for solar charging (>= 0)
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, naming the offending `battery.*` field.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        capacity_kwh: f64,
        max_charge_percent: u8,
        min_charge_percent: u8,
        charge_rate_kwh: f64,
        discharge_rate_kwh: f64,
        charge_loss_percent: u8,
        discharge_loss_percent: u8,
        export_charge_boundary_kwh: f64,
    ) -> Result<Self, ConfigError> {
        let config = BatteryConfig {
            capacity_kwh,
            max_charge_percent,
            min_charge_percent,
            charge_rate_kwh,
            discharge_rate_kwh,
            charge_loss_percent,
            discharge_loss_percent,
            export_charge_boundary_kwh,
        };
        Self::try_from(&config)
    }

    /// Energy ceiling the battery is allowed to hold (kWh).
    pub fn max_charge_capacity_kwh(&self) -> f64 {
        self.capacity_kwh * f64::from(self.max_charge_percent) / 100.0
    }

    /// Energy floor that discharge never dips into (kWh).
    pub fn min_charge_capacity_kwh(&self) -> f64 {
        self.capacity_kwh * f64::from(self.min_charge_percent) / 100.0
    }

    /// Fraction of AC energy that ends up stored when charging.
    pub fn charge_factor_to_battery(&self) -> f64 {
        f64::from(100_u8.saturating_sub(self.charge_loss_percent)) / 100.0
    }

    /// AC energy needed per unit of stored energy when charging.
    pub fn charge_factor_to_ac(&self) -> f64 {
        1.0 + f64::from(self.charge_loss_percent) / 100.0
    }

    /// Fraction of stored energy delivered as AC when discharging.
    pub fn discharge_factor_to_ac(&self) -> f64 {
        f64::from(100_u8.saturating_sub(self.discharge_loss_percent)) / 100.0
    }

    /// Stored energy drawn per unit of AC energy delivered.
    pub fn discharge_factor_to_battery(&self) -> f64 {
        1.0 + f64::from(self.discharge_loss_percent) / 100.0
    }

    /// State of charge as a whole percentage of nominal capacity.
    ///
    /// Rounds half away from zero.
    pub fn capacity_percent(&self, stored_kwh: f64) -> u32 {
        // Stored energy stays within [0, capacity], so the cast never truncates.
        (stored_kwh / self.capacity_kwh * 100.0).round().max(0.0) as u32
    }
}

impl TryFrom<&BatteryConfig> for BatteryProfile {
    type Error = ConfigError;

    fn try_from(config: &BatteryConfig) -> Result<Self, Self::Error> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err);
        }

        Ok(Self {
            capacity_kwh: config.capacity_kwh,
            max_charge_percent: config.max_charge_percent,
            min_charge_percent: config.min_charge_percent,
            charge_rate_kwh: config.charge_rate_kwh,
            discharge_rate_kwh: config.discharge_rate_kwh,
            charge_loss_percent: config.charge_loss_percent,
            discharge_loss_percent: config.discharge_loss_percent,
            export_charge_boundary_kwh: config.export_charge_boundary_kwh,
        })
    }
}
