//! Temperature feedback on absorption

use crate::error::Result;
use crate::material::{check_group, check_length};
use crate::state::State;

/// Temperature (K) at which the tabulated cross sections are defined
pub const REFERENCE_TEMPERATURE: f64 = 300.0;

/// Per-state temperatures and per-group feedback coefficients
///
/// Absorption is corrected by a Doppler-like multiplier
///
/// ```text
/// 1 + gamma[g] * (sqrt(T[state]) - sqrt(300))
/// ```
///
/// Every gamma is zero by default, so feedback does nothing until the
/// coefficients are set.
///
/// ```rust
/// # use ktools_material::{State, TemperatureModel};
/// let mut model = TemperatureModel::new(2);
/// model.set_gamma(&[0.1, 0.0]).unwrap();
/// model.set_temperature(State::Forward, 400.0);
///
/// let expected = 1.0 + 0.1 * (400f64.sqrt() - 300f64.sqrt());
/// assert_eq!(model.feedback_multiplier(0, State::Forward).unwrap(), expected);
/// assert_eq!(model.feedback_multiplier(1, State::Forward).unwrap(), 1.0);
/// assert_eq!(model.feedback_multiplier(0, State::Current).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureModel {
    temperature: [f64; State::COUNT],
    gamma: Vec<f64>,
}

impl Default for TemperatureModel {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TemperatureModel {
    /// Every state at the reference temperature, with zero feedback
    pub fn new(num_groups: usize) -> Self {
        Self {
            temperature: [REFERENCE_TEMPERATURE; State::COUNT],
            gamma: vec![0.0; num_groups],
        }
    }

    /// Set the temperature (K) of a state
    pub fn set_temperature(&mut self, state: State, temperature: f64) {
        self.temperature[state.index()] = temperature;
    }

    /// Temperature (K) of a state
    pub fn temperature(&self, state: State) -> f64 {
        self.temperature[state.index()]
    }

    /// Set the feedback coefficient for every group
    pub fn set_gamma(&mut self, gamma: &[f64]) -> Result<()> {
        check_length("gamma", self.gamma.len(), gamma.len())?;
        self.gamma.copy_from_slice(gamma);
        Ok(())
    }

    /// Feedback coefficients for every group
    pub fn gamma(&self) -> &[f64] {
        &self.gamma
    }

    /// Reallocate zeroed coefficients for a new group structure
    pub(crate) fn reset_gamma(&mut self, num_groups: usize) {
        self.gamma = vec![0.0; num_groups];
    }

    /// Absorption multiplier for a group at the temperature of a state
    pub fn feedback_multiplier(&self, group: usize, state: State) -> Result<f64> {
        check_group(group, self.gamma.len())?;
        let dt = self.temperature(state).sqrt() - REFERENCE_TEMPERATURE.sqrt();
        Ok(1.0 + self.gamma[group] * dt)
    }
}
