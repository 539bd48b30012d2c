//! Delay timers.
//!
//! Elapsed time is counted in whole ticks of the clock resolution, so a
//! duration of 1 s at 100 ms resolution is exactly 10 ticks with no float drift.
//! Durations that are not a multiple of the resolution round per
//! [`TIMER_TICK_ROUNDING`].

use crate::core::components::kinds;
use crate::core::components::traits::{expect_arity, Evaluator};
use crate::core::errors::EvaluatorError;
use crate::core::execution::clock::Clock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRounding {
    Floor,
    Ceiling,
}

/// A timer fires on the first tick at which elapsed >= duration, i.e. after
/// ceil(duration / resolution) ticks.
pub const TIMER_TICK_ROUNDING: TickRounding = TickRounding::Ceiling;

/// Number of ticks needed to cover `duration` at `resolution`
pub fn ticks_for(duration: Duration, resolution: Duration) -> u64 {
    let resolution = resolution.as_nanos();
    if resolution == 0 {
        return 0;
    }
    let duration = duration.as_nanos();
    let ticks = match TIMER_TICK_ROUNDING {
        TickRounding::Floor => duration / resolution,
        TickRounding::Ceiling => duration.div_ceil(resolution),
    };
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// On-delay: output rises after the input has been true for `duration`
#[derive(Debug, Clone)]
pub struct TimerOn {
    duration: Duration,
    elapsed_ticks: u64,
    output: bool,
}

impl TimerOn {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed_ticks: 0,
            output: false,
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }
}

impl Evaluator for TimerOn {
    fn kind(&self) -> &'static str {
        kinds::TIMER_ON
    }

    fn run(&mut self, inputs: &[bool], clock: &Clock) -> Result<(), EvaluatorError> {
        expect_arity(kinds::TIMER_ON, inputs, 1)?;
        if inputs[0] {
            self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
            self.output = self.elapsed_ticks >= ticks_for(self.duration, clock.resolution());
        } else {
            self.elapsed_ticks = 0;
            self.output = false;
        }
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}

/// Off-delay: output follows a rising input at once and falls `duration`
/// after the input went false
#[derive(Debug, Clone)]
pub struct TimerOff {
    duration: Duration,
    elapsed_ticks: u64,
    output: bool,
}

impl TimerOff {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed_ticks: 0,
            output: false,
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }
}

impl Evaluator for TimerOff {
    fn kind(&self) -> &'static str {
        kinds::TIMER_OFF
    }

    fn run(&mut self, inputs: &[bool], clock: &Clock) -> Result<(), EvaluatorError> {
        expect_arity(kinds::TIMER_OFF, inputs, 1)?;
        if inputs[0] {
            self.elapsed_ticks = 0;
            self.output = true;
        } else if self.output {
            self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
            if self.elapsed_ticks >= ticks_for(self.duration, clock.resolution()) {
                self.output = false;
            }
        }
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}

/// Pulse: a rising input edge produces a true output lasting `duration`,
/// whatever the input does meanwhile
#[derive(Debug, Clone)]
pub struct TimerPulse {
    duration: Duration,
    elapsed_ticks: u64,
    last_input: bool,
    output: bool,
}

impl TimerPulse {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed_ticks: 0,
            last_input: false,
            output: false,
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }
}

impl Evaluator for TimerPulse {
    fn kind(&self) -> &'static str {
        kinds::TIMER_PULSE
    }

    fn run(&mut self, inputs: &[bool], clock: &Clock) -> Result<(), EvaluatorError> {
        expect_arity(kinds::TIMER_PULSE, inputs, 1)?;
        let input = inputs[0];
        let rising = input && !self.last_input;
        self.last_input = input;

        if rising {
            self.elapsed_ticks = 0;
            self.output = ticks_for(self.duration, clock.resolution()) > 0;
        } else if self.output {
            self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
            if self.elapsed_ticks >= ticks_for(self.duration, clock.resolution()) {
                self.output = false;
            }
        }
        Ok(())
    }

    fn output(&self) -> bool {
        self.output
    }
}
