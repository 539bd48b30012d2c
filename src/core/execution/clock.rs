use std::time::Duration;

/// Discrete simulation time: a tick counter with a fixed period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    cycle: u64,
    resolution: Duration,
}

impl Clock {
    pub fn new(resolution: Duration) -> Self {
        Self {
            cycle: 0,
            resolution,
        }
    }

    /// Number of completed ticks
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Time per tick
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Simulated time covered by the completed ticks
    pub fn elapsed(&self) -> Duration {
        self.resolution
            .checked_mul(u32::try_from(self.cycle).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX)
    }

    pub fn tick(&mut self) {
        self.cycle += 1;
    }
}
