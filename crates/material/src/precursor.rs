//! Delayed neutron precursor data per state

use crate::error::{Error, Result};
use crate::state::State;

use log::debug;

/// Precursor concentrations and emission frequencies for every state
///
/// Values are indexed by (state, delay group) at `state*ndg + dg`, with one
/// row of `ndg` values for each of the six states.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrecursorStore {
    num_delay_groups: usize,
    conc: Vec<f64>,
    freq: Vec<f64>,
}

impl PrecursorStore {
    /// Zeroed rows for `num_delay_groups` delay groups
    pub fn new(num_delay_groups: usize) -> Self {
        debug!("Allocating precursor data for {num_delay_groups} delay groups");
        Self {
            num_delay_groups,
            conc: vec![0.0; num_delay_groups * State::COUNT],
            freq: vec![0.0; num_delay_groups * State::COUNT],
        }
    }

    /// Number of delay groups
    pub fn num_delay_groups(&self) -> usize {
        self.num_delay_groups
    }

    /// Set the precursor concentration of a delay group
    pub fn set_conc(&mut self, state: State, group: usize, conc: f64) -> Result<()> {
        let i = self.index(state, group)?;
        self.conc[i] = conc;
        Ok(())
    }

    /// Precursor concentration of a delay group
    pub fn conc(&self, state: State, group: usize) -> Result<f64> {
        Ok(self.conc[self.index(state, group)?])
    }

    /// Set the precursor emission frequency of a delay group
    pub fn set_freq(&mut self, state: State, group: usize, freq: f64) -> Result<()> {
        let i = self.index(state, group)?;
        self.freq[i] = freq;
        Ok(())
    }

    /// Precursor emission frequency of a delay group
    pub fn freq(&self, state: State, group: usize) -> Result<f64> {
        Ok(self.freq[self.index(state, group)?])
    }

    /// Copy every concentration from one state to another
    pub fn copy_conc(&mut self, state_from: State, state_to: State) {
        copy_row(&mut self.conc, self.num_delay_groups, state_from, state_to);
    }

    /// Copy every emission frequency from one state to another
    pub fn copy_freq(&mut self, state_from: State, state_to: State) {
        copy_row(&mut self.freq, self.num_delay_groups, state_from, state_to);
    }

    fn index(&self, state: State, group: usize) -> Result<usize> {
        if group >= self.num_delay_groups {
            return Err(Error::OutOfRange {
                quantity: "delay group",
                index: group,
                bound: self.num_delay_groups,
            });
        }
        Ok(state.index() * self.num_delay_groups + group)
    }
}

/// Copy one row of `ndg` values onto another
fn copy_row(values: &mut [f64], ndg: usize, state_from: State, state_to: State) {
    let src = state_from.index() * ndg;
    values.copy_within(src..src + ndg, state_to.index() * ndg);
}
