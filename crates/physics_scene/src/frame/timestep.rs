//! Fixed-step accumulator
//!
//! Real time is accumulated in units of `nanoseconds × tick_rate_hz`, so one
//! tick is exactly one billion units whatever the rate. Frame times that add
//! up to a whole number of ticks always yield exactly that many ticks, with
//! no floating-point drift.

use std::time::Duration;

const UNITS_PER_TICK: u128 = 1_000_000_000;

/// Result of feeding one frame into the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulated {
    /// Ticks now due
    pub ticks: u32,
    /// The frame exceeded the cap
    pub clamped: bool,
    /// Real time dropped by the cap
    pub discarded: Duration,
}

/// Fixed-step accumulator with a capped backlog
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    tick_rate_hz: u32,
    max_frame: Duration,
    accumulator: u128,
}

impl FixedTimestep {
    /// Create an accumulator running at `tick_rate_hz`, holding at most
    /// `max_frame` of real time
    pub fn new(tick_rate_hz: u32, max_frame: Duration) -> Self {
        Self {
            tick_rate_hz: tick_rate_hz.max(1),
            max_frame,
            accumulator: 0,
        }
    }

    /// Fixed step in seconds
    pub fn timestep(&self) -> f32 {
        1.0 / self.tick_rate_hz as f32
    }

    /// Tick rate
    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    /// Add one frame of real time
    ///
    /// The accumulator never holds more than the cap; time beyond it is
    /// discarded rather than simulated later.
    pub fn accumulate(&mut self, frame: Duration) -> Accumulated {
        let rate = u128::from(self.tick_rate_hz);
        let cap = self.max_frame.as_nanos() * rate;

        self.accumulator += frame.as_nanos() * rate;
        let discarded = if self.accumulator > cap {
            let excess_nanos = (self.accumulator - cap) / rate;
            self.accumulator = cap;
            Duration::from_nanos(u64::try_from(excess_nanos).unwrap_or(u64::MAX))
        } else {
            Duration::ZERO
        };

        Accumulated {
            ticks: self.pending_ticks(),
            clamped: !discarded.is_zero(),
            discarded,
        }
    }

    /// Consume one tick's worth of time if available
    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= UNITS_PER_TICK {
            self.accumulator -= UNITS_PER_TICK;
            true
        } else {
            false
        }
    }

    /// Whole ticks currently in the accumulator
    pub fn pending_ticks(&self) -> u32 {
        u32::try_from(self.accumulator / UNITS_PER_TICK).unwrap_or(u32::MAX)
    }

    /// Fraction of a tick left over, in `[0, 1)` once due ticks are consumed
    pub fn alpha(&self) -> f32 {
        ((self.accumulator % UNITS_PER_TICK) as f64 / UNITS_PER_TICK as f64) as f32
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = 0;
    }
}

/// Convert seconds to a frame duration, rounding to the nearest nanosecond
///
/// Negative and non-finite inputs become zero.
pub fn frame_duration(seconds: f32) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_nanos((f64::from(seconds) * 1.0e9).round() as u64)
    } else {
        Duration::ZERO
    }
}
