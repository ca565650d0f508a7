//! Mapping of temporal states to simulation time

use crate::state::State;

use std::sync::atomic::{AtomicU64, Ordering};

/// Provides the simulation time of every [State]
///
/// A single time stepper is shared by every material in a simulation run, so
/// implementations must be safe to read from many threads. Materials only
/// ever read from it.
pub trait TimeStepper: Send + Sync + std::fmt::Debug {
    /// Simulation time (s) of the given state
    fn time(&self, state: State) -> f64;
}

/// Simple time stepper holding one time value per state
///
/// Times are stored as atomics so that a single driver can update them
/// through a shared reference while materials read them. Writes use
/// `Release` ordering and reads `Acquire`, so a time written before
/// synchronising materials for that state is always the one they see.
///
/// ```rust
/// # use ktools_material::{State, StateClock, TimeStepper};
/// let clock = StateClock::new();
/// clock.set_time(State::Forward, 0.5);
/// clock.convert_time(State::Forward, State::Current);
/// clock.increment_time(State::Forward, 0.25);
///
/// assert_eq!(clock.time(State::Current), 0.5);
/// assert_eq!(clock.time(State::Forward), 0.75);
/// ```
#[derive(Debug, Default)]
pub struct StateClock {
    times: [AtomicU64; State::COUNT],
}

impl StateClock {
    /// All states start at t=0.0
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time (s) for a state
    pub fn set_time(&self, state: State, time: f64) {
        self.times[state.index()].store(time.to_bits(), Ordering::Release);
    }

    /// Advance the time of a state by `dt` (s)
    pub fn increment_time(&self, state: State, dt: f64) {
        self.set_time(state, self.time(state) + dt);
    }

    /// Copy the time of one state onto another
    pub fn convert_time(&self, state_from: State, state_to: State) {
        self.set_time(state_to, self.time(state_from));
    }
}

impl TimeStepper for StateClock {
    fn time(&self, state: State) -> f64 {
        f64::from_bits(self.times[state.index()].load(Ordering::Acquire))
    }
}
