// Domain entities consumed by the optimizer
// These records are produced by the catalog loader and the contact (access) computation

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

/// Seconds in an average Julian year
pub const SECONDS_PER_YEAR: f64 = 365.25 * 86400.0;

/// Seconds in an average month (1/12 of a Julian year)
pub const SECONDS_PER_MONTH: f64 = SECONDS_PER_YEAR / 12.0;

/// Bits in a gigabyte
pub const BITS_PER_GB: f64 = 8.0e9;

/// Convert fractional seconds to a `TimeDelta` with microsecond precision
pub fn seconds(value: f64) -> TimeDelta {
    TimeDelta::microseconds((value * 1.0e6).round() as i64)
}

/// Signed seconds between two instants (`to - from`)
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1.0e6,
        None => delta.num_milliseconds() as f64 / 1.0e3,
    }
}

/// Ground station provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    /// One-time cost of integrating with the provider
    #[serde(default)]
    pub integration_cost: f64,
}

impl Provider {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            integration_cost: 0.0,
        }
    }

    pub fn with_integration_cost(mut self, cost: f64) -> Self {
        self.integration_cost = cost;
        self
    }
}

/// Ground station operated by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub provider_id: String,
    #[serde(default)]
    pub setup_cost: f64,
    #[serde(default)]
    pub per_satellite_license_cost: f64,
    #[serde(default)]
    pub monthly_cost: f64,
    #[serde(default)]
    pub cost_per_pass: f64,
    #[serde(default)]
    pub cost_per_minute: f64,
    #[serde(default = "default_antennas")]
    pub antennas: usize,
    /// Maximum downlink rate in bits per second
    #[serde(default)]
    pub datarate: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

fn default_antennas() -> usize {
    1
}

impl Station {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider_id: provider_id.into(),
            setup_cost: 0.0,
            per_satellite_license_cost: 0.0,
            monthly_cost: 0.0,
            cost_per_pass: 0.0,
            cost_per_minute: 0.0,
            antennas: 1,
            datarate: 0.0,
            longitude: 0.0,
            latitude: 0.0,
            altitude: 0.0,
        }
    }

    pub fn with_costs(
        mut self,
        setup_cost: f64,
        per_satellite_license_cost: f64,
        monthly_cost: f64,
    ) -> Self {
        self.setup_cost = setup_cost;
        self.per_satellite_license_cost = per_satellite_license_cost;
        self.monthly_cost = monthly_cost;
        self
    }

    pub fn with_pass_pricing(mut self, cost_per_pass: f64, cost_per_minute: f64) -> Self {
        self.cost_per_pass = cost_per_pass;
        self.cost_per_minute = cost_per_minute;
        self
    }

    pub fn with_antennas(mut self, antennas: usize) -> Self {
        self.antennas = antennas;
        self
    }

    pub fn with_datarate(mut self, datarate: f64) -> Self {
        self.datarate = datarate;
        self
    }

    pub fn with_location(mut self, longitude: f64, latitude: f64, altitude: f64) -> Self {
        self.longitude = longitude;
        self.latitude = latitude;
        self.altitude = altitude;
        self
    }
}

/// Satellite to be served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    pub id: String,
    pub satcat_id: String,
    pub name: String,
    /// Maximum downlink rate in bits per second
    #[serde(default)]
    pub datarate: f64,
}

impl Satellite {
    pub fn new(
        id: impl Into<String>,
        satcat_id: impl Into<String>,
        name: impl Into<String>,
        datarate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            satcat_id: satcat_id.into(),
            name: name.into(),
            datarate,
        }
    }
}

/// Visibility window between a satellite and a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub station_id: String,
    pub provider_id: String,
    pub satellite_id: String,
    pub t_start: DateTime<Utc>,
    pub t_end: DateTime<Utc>,
    /// Seconds
    pub t_duration: f64,
    /// Effective rate in bits per second
    pub datarate: f64,
    /// Bits transferable over the whole contact
    pub data_volume: f64,
    /// Price of the pass
    pub cost: f64,
    pub cost_per_pass: f64,
    pub cost_per_minute: f64,
}

impl Contact {
    /// Build a contact, deriving duration, rate, volume and cost from its endpoints
    pub fn new(
        id: impl Into<String>,
        station: &Station,
        satellite: &Satellite,
        t_start: DateTime<Utc>,
        t_end: DateTime<Utc>,
    ) -> Self {
        let t_duration = seconds_between(t_start, t_end);
        let datarate = station.datarate.min(satellite.datarate);

        Self {
            id: id.into(),
            station_id: station.id.clone(),
            provider_id: station.provider_id.clone(),
            satellite_id: satellite.id.clone(),
            t_start,
            t_end,
            t_duration,
            datarate,
            data_volume: datarate * t_duration,
            cost: station.cost_per_pass + t_duration / 60.0 * station.cost_per_minute,
            cost_per_pass: station.cost_per_pass,
            cost_per_minute: station.cost_per_minute,
        }
    }

    /// Closed-interval overlap: contacts touching at an instant overlap
    pub fn overlaps(&self, other: &Contact) -> bool {
        self.t_start <= other.t_end && other.t_start <= self.t_end
    }

    /// Whether the contact intersects the closed window `[start, end]`
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.t_end >= start && self.t_start <= end
    }
}

/// Decision horizon and the sampled sub-horizon over which contacts were computed
///
/// Deserialization runs the same checks as [`OptimizationWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct OptimizationWindow {
    pub opt_start: DateTime<Utc>,
    pub opt_end: DateTime<Utc>,
    pub sim_start: DateTime<Utc>,
    pub sim_end: DateTime<Utc>,
}

// Unchecked wire form of a window
#[derive(Deserialize)]
struct WindowBounds {
    opt_start: DateTime<Utc>,
    opt_end: DateTime<Utc>,
    sim_start: DateTime<Utc>,
    sim_end: DateTime<Utc>,
}

impl TryFrom<WindowBounds> for OptimizationWindow {
    type Error = OptimizerError;

    fn try_from(bounds: WindowBounds) -> Result<Self> {
        Self::new(bounds.opt_start, bounds.opt_end, bounds.sim_start, bounds.sim_end)
    }
}

impl OptimizationWindow {
    /// Create a window, checking that both horizons are non-empty and sim fits in opt
    pub fn new(
        opt_start: DateTime<Utc>,
        opt_end: DateTime<Utc>,
        sim_start: DateTime<Utc>,
        sim_end: DateTime<Utc>,
    ) -> Result<Self> {
        let window = Self {
            opt_start,
            opt_end,
            sim_start,
            sim_end,
        };

        if window.opt_duration() <= 0.0 {
            return Err(OptimizerError::config(format!(
                "optimization window must end after it starts ({} .. {})",
                opt_start, opt_end
            )));
        }
        if window.sim_duration() <= 0.0 {
            return Err(OptimizerError::config(format!(
                "simulation window must end after it starts ({} .. {})",
                sim_start, sim_end
            )));
        }
        if window.sim_duration() > window.opt_duration() {
            return Err(OptimizerError::config(format!(
                "simulation window ({} s) is longer than the optimization window ({} s)",
                window.sim_duration(),
                window.opt_duration()
            )));
        }

        Ok(window)
    }

    /// Window whose simulated span starts with the optimization span
    pub fn from_durations(start: DateTime<Utc>, opt_duration: f64, sim_duration: f64) -> Result<Self> {
        let end_after = |duration: f64| {
            start.checked_add_signed(seconds(duration)).ok_or_else(|| {
                OptimizerError::config(format!("duration of {} s is out of range", duration))
            })
        };
        Self::new(start, end_after(opt_duration)?, start, end_after(sim_duration)?)
    }

    /// T_opt in seconds
    pub fn opt_duration(&self) -> f64 {
        seconds_between(self.opt_start, self.opt_end)
    }

    /// T_sim in seconds
    pub fn sim_duration(&self) -> f64 {
        seconds_between(self.sim_start, self.sim_end)
    }

    /// Extrapolation factor T_opt / T_sim
    pub fn scale(&self) -> f64 {
        self.opt_duration() / self.sim_duration()
    }

    /// Number of average months in the optimization horizon
    pub fn opt_months(&self) -> f64 {
        self.opt_duration() / SECONDS_PER_MONTH
    }
}
