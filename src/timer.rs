/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The delay and sound timers, and a clock for driving them.

use time;

/// The frequency at which the delay and sound timers count down, in Hz.
pub const TIMER_FREQ: u32 = 60;

/// The delay and sound timers.
///
/// Both count down by one on each `tick`, stopping at zero.  Executing
/// instructions never ticks them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    /// The delay timer.
    pub delay: u8,
    /// The sound timer.
    pub sound: u8,
}

impl Timers {
    /// Returns a pair of stopped timers.
    pub fn new() -> Self {
        Timers::default()
    }

    /// Counts both timers down by one.
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }
}

/// A basic clock.
///
/// A clock divides wall-clock time into ticks at a fixed frequency, so a
/// front-end can find out how many instruction cycles or timer ticks are due
/// regardless of how often it gets around to asking.
#[derive(Debug)]
pub struct Clock {
    /// The frequency of the clock, in Hz.
    frequency: u32,
    /// The time at which the clock was started, in nanoseconds.
    start: u64,
    /// The number of ticks that had elapsed at the last lap.
    ticks: u64,
}

impl Clock {
    /// Returns a new clock running at the given frequency, starting now.
    pub fn new(frequency: u32) -> Self {
        Clock::starting_at(frequency, time::precise_time_ns())
    }

    /// Returns a new clock running at the given frequency, as if it had
    /// been started at the given time (in nanoseconds).
    pub fn starting_at(frequency: u32, start: u64) -> Self {
        Clock {
            frequency,
            start,
            ticks: 0,
        }
    }

    /// Returns the frequency of the clock.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Returns the number of ticks which have elapsed since the last call to
    /// this method (or the creation of the clock).
    pub fn lap(&mut self) -> u64 {
        self.lap_at(time::precise_time_ns())
    }

    /// Like `lap`, but taking the current time (in nanoseconds) explicitly.
    ///
    /// Times before the previous lap count as no time at all.
    pub fn lap_at(&mut self, now: u64) -> u64 {
        let elapsed = now.saturating_sub(self.start);
        let ticks = (elapsed as u128 * self.frequency as u128 / 1_000_000_000) as u64;
        let lap = ticks.saturating_sub(self.ticks);
        if ticks > self.ticks {
            self.ticks = ticks;
        }
        lap
    }
}
