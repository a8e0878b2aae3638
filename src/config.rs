//! # config.rs – Centralized Parameter Store
//!
//! This module holds all default parameters used throughout the fleet, and the
//! [`FleetConfig`] struct that carries them at runtime.
//! Keeping configuration in one place makes tuning, experimentation, and testing easier.

use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::floor::{Floor, FloorRange};

//
// ──────────────────────────────────────────────────────────────
//   1. FLEET & BUILDING
// ──────────────────────────────────────────────────────────────
//

/// Default number of cars in the fleet
pub const DEFAULT_NUM_CARS: u8 = 6;

/// Lowest floor of the building
pub const DEFAULT_MIN_FLOOR: Floor = Floor::basement(4);

/// Highest floor of the building
pub const DEFAULT_MAX_FLOOR: Floor = Floor::above(7);

/// Floor every car starts at
pub const DEFAULT_HOME_FLOOR: Floor = Floor::above(1);

/// Maximum number of passengers onboard a car
pub const DEFAULT_CAPACITY: usize = 6;

/// Maximum number of assigned-but-not-boarded pickups per car
pub const DEFAULT_BACKLOG_LIMIT: usize = 10;

/// A waiting passenger may bump the lowest onboard passenger when its
/// priority is strictly greater than this factor times theirs
pub const DEFAULT_PREEMPT_FACTOR: u32 = 5;

//
// ──────────────────────────────────────────────────────────────
//   2. TIMING
// ──────────────────────────────────────────────────────────────
//

/// Travel time for one floor-to-floor hop
pub const TRAVEL_TIME: Duration = Duration::from_millis(400);

/// Minimum time between OPEN and CLOSE
pub const DOOR_TIME: Duration = Duration::from_millis(400);

/// Door time at the target floor of a reposition
pub const REPOSITION_DWELL: Duration = Duration::from_millis(1000);

/// Pause while a shaft split is physically carried out
pub const SPLIT_SETTLE: Duration = Duration::from_millis(1000);

/// Travel time per floor after a shaft split
pub const SPLIT_TRAVEL_TIME: Duration = Duration::from_millis(200);

/// How often a car re-checks a transfer floor held by its partner
pub const POLL_PERIOD: Duration = Duration::from_millis(10);

//
// ──────────────────────────────────────────────────────────────
//   3. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable printing of the fleet table at shutdown
pub static PRINT_TABLE_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable dispatcher and car trace lines
pub static PRINT_ELSE_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

/// Reads one of the print toggles. A poisoned toggle counts as enabled.
pub fn print_enabled(toggle: &Lazy<Mutex<bool>>) -> bool {
    toggle.lock().map(|on| *on).unwrap_or(true)
}

/// Sets one of the print toggles.
pub fn set_print(toggle: &Lazy<Mutex<bool>>, on: bool) {
    if let Ok(mut flag) = toggle.lock() {
        *flag = on;
    }
}

//
// ──────────────────────────────────────────────────────────────
//   4. RUNTIME CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Every tunable of the fleet. Missing fields in a config file fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Number of cars, numbered `1..=num_cars`
    pub num_cars: u8,
    /// Lowest floor of the building
    pub min_floor: Floor,
    /// Highest floor of the building
    pub max_floor: Floor,
    /// Floor every car starts at
    pub home_floor: Floor,
    /// Passengers per car
    pub capacity: usize,
    /// Assigned-but-not-boarded pickups per car
    pub backlog_limit: usize,
    /// Preemption threshold factor
    pub preempt_factor: u32,
    /// Travel time per floor before any split
    #[serde(with = "millis")]
    pub travel_time: Duration,
    /// OPEN to CLOSE time
    #[serde(with = "millis")]
    pub door_time: Duration,
    /// Door time at a reposition target
    #[serde(with = "millis")]
    pub reposition_dwell: Duration,
    /// Shaft split pause
    #[serde(with = "millis")]
    pub split_settle: Duration,
    /// Travel time per floor after a split
    #[serde(with = "millis")]
    pub split_travel_time: Duration,
    /// Transfer floor re-check interval
    #[serde(with = "millis")]
    pub poll_period: Duration,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            num_cars: DEFAULT_NUM_CARS,
            min_floor: DEFAULT_MIN_FLOOR,
            max_floor: DEFAULT_MAX_FLOOR,
            home_floor: DEFAULT_HOME_FLOOR,
            capacity: DEFAULT_CAPACITY,
            backlog_limit: DEFAULT_BACKLOG_LIMIT,
            preempt_factor: DEFAULT_PREEMPT_FACTOR,
            travel_time: TRAVEL_TIME,
            door_time: DOOR_TIME,
            reposition_dwell: REPOSITION_DWELL,
            split_settle: SPLIT_SETTLE,
            split_travel_time: SPLIT_TRAVEL_TIME,
            poll_period: POLL_PERIOD,
        }
    }
}

impl FleetConfig {
    /// Checks that the configuration describes a runnable fleet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cars == 0 {
            return Err(ConfigError::NoCars);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.backlog_limit == 0 {
            return Err(ConfigError::ZeroBacklog);
        }
        if self.preempt_factor == 0 {
            return Err(ConfigError::InvalidPreemptFactor);
        }
        let building = self.building()?;
        if !building.contains(self.home_floor) {
            return Err(ConfigError::HomeOutOfRange {
                home: self.home_floor,
                min: self.min_floor,
                max: self.max_floor,
            });
        }
        Ok(())
    }

    /// The full floor range of the building.
    pub fn building(&self) -> Result<FloorRange, ConfigError> {
        Ok(FloorRange::new(self.min_floor, self.max_floor)?)
    }

    /// Car ids in the fleet.
    pub fn car_ids(&self) -> impl Iterator<Item = u8> {
        1..=self.num_cars
    }
}

/// Deserializes a `Duration` from integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FleetConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.building().unwrap().len(), 11);
        assert_eq!(config.car_ids().count(), 6);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: FleetConfig =
            serde_json::from_str(r#"{"num_cars": 2, "capacity": 2, "door_time": 50}"#).unwrap();
        assert_eq!(config.num_cars, 2);
        assert_eq!(config.capacity, 2);
        assert_eq!(config.door_time, Duration::from_millis(50));
        assert_eq!(config.backlog_limit, DEFAULT_BACKLOG_LIMIT);
    }

    #[test]
    fn home_outside_building_is_rejected() {
        let config = FleetConfig { home_floor: Floor::above(9), ..FleetConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::HomeOutOfRange { .. })));
    }
}
