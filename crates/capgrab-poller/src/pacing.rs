//! Inter-zone and inter-cycle pacing.

use std::time::Duration;

use capgrab_core::config::PacingConfig;

pub use capgrab_core::config::DEFAULT_MAX_ZONE_INTERVAL_SECS;

/// Pauses between launch attempts.
///
/// The zone interval starts at the configured value and grows by one
/// second per rate-limit signal while it is at or below the cap. It never
/// shrinks, so the largest reachable value is `max + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingState {
    /// Current pause between zones, in seconds.
    zone_interval_secs: u64,
    /// Pause between passes over all zones, in seconds.
    cycle_interval_secs: u64,
    /// Growth stops once the zone interval is above this.
    max_zone_interval_secs: u64,
}

impl PacingState {
    pub fn new(zone_interval_secs: u64, cycle_interval_secs: u64, max_zone_interval_secs: u64) -> Self {
        Self {
            zone_interval_secs,
            cycle_interval_secs,
            max_zone_interval_secs,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            config.zone_interval_secs,
            config.cycle_interval_secs,
            config.max_zone_interval_secs,
        )
    }

    /// Record a rate-limit signal. Returns `true` if the interval grew.
    pub fn on_rate_limited(&mut self) -> bool {
        if self.zone_interval_secs <= self.max_zone_interval_secs {
            self.zone_interval_secs += 1;
            true
        } else {
            false
        }
    }

    pub fn zone_interval(&self) -> Duration {
        Duration::from_secs(self.zone_interval_secs)
    }

    pub fn zone_interval_secs(&self) -> u64 {
        self.zone_interval_secs
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn cycle_interval_secs(&self) -> u64 {
        self.cycle_interval_secs
    }

    pub fn max_zone_interval_secs(&self) -> u64 {
        self.max_zone_interval_secs
    }
}

impl Default for PacingState {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}
