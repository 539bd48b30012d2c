/// Configuration for logic simulation runs
///
/// This module provides the settings that control tick timing and the
/// default delay of the built-in timer blocks.
use std::time::Duration;

/// Tick period the editor host uses
pub const DEFAULT_RESOLUTION: Duration = Duration::from_millis(100);

/// Delay of the built-in TIMER-ON, TIMER-OFF and TIMER-PULSE blocks
pub const DEFAULT_TIMER_DURATION: Duration = Duration::from_secs(1);

/// Configuration for simulation execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Period of one tick, both wall-clock (driver) and simulated (timers)
    pub resolution: Duration,
    /// Delay applied by the built-in timer factories
    pub timer_duration: Duration,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration ticks every 100 ms with 1 s timers
    pub fn new() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            timer_duration: DEFAULT_TIMER_DURATION,
        }
    }

    /// Set the tick period
    ///
    /// # Arguments
    /// * `resolution` - Time per tick, must be non-zero to drive a timer
    pub fn with_resolution(mut self, resolution: Duration) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the delay of the built-in timers
    pub fn with_timer_duration(mut self, duration: Duration) -> Self {
        self.timer_duration = duration;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
