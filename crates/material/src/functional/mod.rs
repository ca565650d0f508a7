//! Time and temperature dependent material data

mod sync;

pub use sync::sync_all;

// crate modules
use crate::error::{Error, Result};
use crate::material::{check_length, Material};
use crate::precursor::PrecursorStore;
use crate::reference::ReferenceTable;
use crate::state::State;
use crate::stepper::TimeStepper;
use crate::temperature::TemperatureModel;

// ktools modules
use ktools_utils::f;

// standard library
use std::sync::Arc;

use log::debug;

/// Material whose cross sections vary with time and temperature
///
/// A [FunctionalMaterial] owns a plain multigroup [Material] holding the
/// *working* cross sections read by solvers, and everything needed to
/// recompute them for any [State]:
///
/// - a [ReferenceTable] of tabulated absorption and scattering over time
/// - a [TemperatureModel] with one temperature per state
/// - optional [PrecursorStore] data for delayed neutrons
/// - a shared handle to the [TimeStepper] of the simulation
///
/// The working cross sections only ever describe one state, the last one
/// passed to [FunctionalMaterial::sync()]. Always sync immediately before
/// reading them.
///
/// ## Flags
///
/// | Flag                | Default | Effect on `sync`                             |
/// | ------------------- | ------- | -------------------------------------------- |
/// | `sigma_a_func_time` | false   | absorption interpolated in time              |
/// | `sigma_a_func_temp` | false   | absorption multiplied by temperature feedback|
/// | `sigma_s_func_time` | false   | scattering interpolated in time              |
/// | `conserve_sigma_t`  | true    | self-scatter adjusted to conserve 1/(3D)     |
///
/// ## Cloning
///
/// Cloning gives a fully independent deep copy of every table, flag,
/// temperature and precursor value. Only the time stepper is shared, since
/// time is global to a simulation run.
///
/// ## Example
///
/// ```rust
/// # use std::sync::Arc;
/// # use ktools_material::{FunctionalMaterial, State, StateClock};
/// let clock = Arc::new(StateClock::new());
/// clock.set_time(State::Current, 5.0);
///
/// let mut material = FunctionalMaterial::new(1);
/// material.configure(2, 2).unwrap();
/// material.set_time(&[0.0, 10.0]).unwrap();
/// material.set_sigma_a_time(2, &[0.1, 0.2, 0.3, 0.4]).unwrap();
/// material.set_sigma_a_func_time(true);
/// material.set_conserve_sigma_t(false);
/// material.set_time_stepper(clock.clone());
///
/// material.sync(State::Current).unwrap();
/// let sigma_a = material.base().sigma_a();
/// assert!((sigma_a[0] - 0.2).abs() < 1e-12);
/// assert!((sigma_a[1] - 0.3).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct FunctionalMaterial {
    base: Material,
    reference: Option<ReferenceTable>,
    temperature: TemperatureModel,
    precursors: Option<PrecursorStore>,
    stepper: Option<Arc<dyn TimeStepper>>,
    sigma_a_func_temp: bool,
    sigma_a_func_time: bool,
    sigma_s_func_time: bool,
    conserve_sigma_t: bool,
    synced_state: Option<State>,
}

impl FunctionalMaterial {
    /// New unconfigured material, every state at the reference temperature
    pub fn new(id: u32) -> Self {
        Self {
            base: Material::new(id),
            reference: None,
            temperature: TemperatureModel::default(),
            precursors: None,
            stepper: None,
            sigma_a_func_temp: false,
            sigma_a_func_time: false,
            sigma_s_func_time: false,
            conserve_sigma_t: true,
            synced_state: None,
        }
    }

    /// Material identifier
    pub fn id(&self) -> u32 {
        self.base.id()
    }

    /// Number of energy groups, zero until configured
    pub fn num_groups(&self) -> usize {
        self.base.num_groups()
    }

    /// Number of tabulated time steps, zero until configured
    pub fn num_time_steps(&self) -> usize {
        self.reference
            .as_ref()
            .map_or(0, ReferenceTable::num_time_steps)
    }

    /// Fix the group and time step counts, allocating every table
    ///
    /// This can only be done once. Both counts must be non-zero.
    pub fn configure(&mut self, num_groups: usize, num_time_steps: usize) -> Result<()> {
        if self.reference.is_some() {
            return Err(Error::InvalidConfiguration(f!(
                "material {} is already configured",
                self.id()
            )));
        }
        if num_groups == 0 || num_time_steps == 0 {
            return Err(Error::InvalidConfiguration(f!(
                "material {} needs at least one group and one time step, found {} and {}",
                self.id(),
                num_groups,
                num_time_steps
            )));
        }

        debug!(
            "Configuring material {} with {num_groups} groups and {num_time_steps} time steps",
            self.id()
        );
        self.base.set_num_energy_groups(num_groups);
        self.reference = Some(ReferenceTable::new(num_groups, num_time_steps));
        self.temperature.reset_gamma(num_groups);
        self.synced_state = None;
        Ok(())
    }

    /// Working multigroup cross sections
    pub fn base(&self) -> &Material {
        &self.base
    }

    /// Mutable access to the working cross sections
    ///
    /// Use this for the data that do not vary in time, such as fission,
    /// chi, buckling, and diffusion coefficients.
    ///
    /// Writes made through here are not tracked. Call
    /// [FunctionalMaterial::sync()] again before reading the working data.
    pub fn base_mut(&mut self) -> &mut Material {
        &mut self.base
    }

    /// Reference tables, if configured
    pub fn reference(&self) -> Option<&ReferenceTable> {
        self.reference.as_ref()
    }

    /// Mutable reference tables, if configured
    pub fn reference_mut(&mut self) -> Option<&mut ReferenceTable> {
        self.reference.as_mut()
    }

    /// State currently held by the working cross sections
    pub fn synced_state(&self) -> Option<State> {
        self.synced_state
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Apply temperature feedback to absorption
    pub fn set_sigma_a_func_temp(&mut self, func_temp: bool) {
        self.sigma_a_func_temp = func_temp;
    }

    /// Interpolate absorption in time
    pub fn set_sigma_a_func_time(&mut self, func_time: bool) {
        self.sigma_a_func_time = func_time;
    }

    /// Interpolate scattering in time
    pub fn set_sigma_s_func_time(&mut self, func_time: bool) {
        self.sigma_s_func_time = func_time;
    }

    /// Adjust self-scatter to conserve the diffusion total cross section
    pub fn set_conserve_sigma_t(&mut self, conserve_sigma_t: bool) {
        self.conserve_sigma_t = conserve_sigma_t;
    }

    /// Whether absorption depends on temperature
    pub fn sigma_a_func_temp(&self) -> bool {
        self.sigma_a_func_temp
    }

    /// Whether absorption depends on time
    pub fn sigma_a_func_time(&self) -> bool {
        self.sigma_a_func_time
    }

    /// Whether scattering depends on time
    pub fn sigma_s_func_time(&self) -> bool {
        self.sigma_s_func_time
    }

    /// Whether the total cross section is conserved
    pub fn conserve_sigma_t(&self) -> bool {
        self.conserve_sigma_t
    }

    // ------------------------------------------------------------------
    // Cross section ingestion
    // ------------------------------------------------------------------

    /// Set static absorption for the first time step and the working data
    pub fn set_sigma_a(&mut self, xs: &[f64]) -> Result<()> {
        self.table_mut()?.set_sigma_a(xs)?;
        self.base.set_sigma_a(xs)?;
        self.synced_state = None;
        Ok(())
    }

    /// Set static scattering in (from, to) order for the first time step
    /// and the working data
    pub fn set_sigma_s(&mut self, xs: &[f64]) -> Result<()> {
        self.table_mut()?.set_sigma_s(xs)?;
        self.base.set_sigma_s(xs)?;
        self.synced_state = None;
        Ok(())
    }

    /// Set absorption for every time step, time-major
    ///
    /// The working absorption is seeded from the first time step, including
    /// leakage if both diffusion coefficients and buckling are known.
    pub fn set_sigma_a_time(&mut self, num_time_steps: usize, xs: &[f64]) -> Result<()> {
        self.table_mut()?.set_sigma_a_time(num_time_steps, xs)?;

        let ng = self.num_groups();
        let mut seed = xs[..ng].to_vec();
        if let (Some(dif_coef), Some(buckling)) = (self.base.dif_coef(), self.base.buckling()) {
            for (g, xs) in seed.iter_mut().enumerate() {
                *xs += dif_coef[g] * buckling[g];
            }
        }
        self.base.sigma_a_mut().copy_from_slice(&seed);
        self.synced_state = None;
        Ok(())
    }

    /// Set scattering for every time step, as (from, to) blocks
    ///
    /// The working scattering is seeded from the first time step.
    pub fn set_sigma_s_time(&mut self, num_time_steps: usize, xs: &[f64]) -> Result<()> {
        let table = self.table_mut()?;
        table.set_sigma_s_time(num_time_steps, xs)?;

        let block = table.num_groups() * table.num_groups();
        let seed = table.sigma_s_ref()[..block].to_vec();
        self.base.sigma_s_mut().copy_from_slice(&seed);
        self.synced_state = None;
        Ok(())
    }

    /// Set the tabulated times (s)
    pub fn set_time(&mut self, time: &[f64]) -> Result<()> {
        self.table_mut()?.set_time(time)
    }

    /// Tabulated times (s), if set
    pub fn time(&self) -> Option<&[f64]> {
        self.reference.as_ref().and_then(ReferenceTable::time)
    }

    // ------------------------------------------------------------------
    // Temperature
    // ------------------------------------------------------------------

    /// Set the temperature (K) of a state
    pub fn set_temperature(&mut self, state: State, temperature: f64) {
        self.temperature.set_temperature(state, temperature);
    }

    /// Temperature (K) of a state
    pub fn temperature(&self, state: State) -> f64 {
        self.temperature.temperature(state)
    }

    /// Set the temperature feedback coefficients
    pub fn set_gamma(&mut self, gamma: &[f64]) -> Result<()> {
        self.table()?;
        self.temperature.set_gamma(gamma)
    }

    /// Temperature feedback coefficients
    pub fn gamma(&self) -> &[f64] {
        self.temperature.gamma()
    }

    /// Temperature model for every state
    pub fn temperature_model(&self) -> &TemperatureModel {
        &self.temperature
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Attach the time stepper shared by the simulation
    pub fn set_time_stepper(&mut self, stepper: Arc<dyn TimeStepper>) {
        self.stepper = Some(stepper);
    }

    /// Shared time stepper, if attached
    pub fn time_stepper(&self) -> Option<&Arc<dyn TimeStepper>> {
        self.stepper.as_ref()
    }

    /// Absorption of a group interpolated to the time of a state
    pub fn interpolate_sigma_a(&self, state: State, group: usize) -> Result<f64> {
        let t = self.stepper()?.time(state);
        self.table()?.interpolate_sigma_a(t, group)
    }

    /// Scattering between groups interpolated to the time of a state
    pub fn interpolate_sigma_s(&self, state: State, from: usize, to: usize) -> Result<f64> {
        let t = self.stepper()?.time(state);
        self.table()?.interpolate_sigma_s(t, from, to)
    }

    // ------------------------------------------------------------------
    // Precursors
    // ------------------------------------------------------------------

    /// Allocate zeroed precursor data for `num_delay_groups` delay groups
    ///
    /// Calling this again discards any existing precursor data.
    pub fn initialize_transient_props(&mut self, num_delay_groups: usize) {
        self.precursors = Some(PrecursorStore::new(num_delay_groups));
    }

    /// Precursor data, if initialised
    pub fn precursors(&self) -> Option<&PrecursorStore> {
        self.precursors.as_ref()
    }

    /// Set the precursor concentration of a delay group
    pub fn set_prec_conc(&mut self, state: State, group: usize, conc: f64) -> Result<()> {
        self.precursors_mut()?.set_conc(state, group, conc)
    }

    /// Precursor concentration of a delay group
    pub fn prec_conc(&self, state: State, group: usize) -> Result<f64> {
        self.precursors_ref()?.conc(state, group)
    }

    /// Set the precursor emission frequency of a delay group
    pub fn set_prec_freq(&mut self, state: State, group: usize, freq: f64) -> Result<()> {
        self.precursors_mut()?.set_freq(state, group, freq)
    }

    /// Precursor emission frequency of a delay group
    pub fn prec_freq(&self, state: State, group: usize) -> Result<f64> {
        self.precursors_ref()?.freq(state, group)
    }

    /// Copy every precursor concentration from one state to another
    pub fn copy_prec_conc(&mut self, state_from: State, state_to: State) -> Result<()> {
        self.precursors_mut()?.copy_conc(state_from, state_to);
        Ok(())
    }

    /// Copy every precursor emission frequency from one state to another
    pub fn copy_prec_freq(&mut self, state_from: State, state_to: State) -> Result<()> {
        self.precursors_mut()?.copy_freq(state_from, state_to);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Copy plumbing
    // ------------------------------------------------------------------

    /// Copy the working scattering matrix into another material
    ///
    /// The receiving material no longer describes any synchronised state.
    pub fn copy_sigma_s(&self, to: &mut FunctionalMaterial) -> Result<()> {
        check_length("sigma_s", self.base.sigma_s().len(), to.base.sigma_s().len())?;
        to.base.sigma_s_mut().copy_from_slice(self.base.sigma_s());
        to.synced_state = None;
        Ok(())
    }

    /// Copy the full reference scattering table into another material
    pub fn copy_sigma_s_ref(&self, to: &mut FunctionalMaterial) -> Result<()> {
        let from_table = self.table()?;
        let to_table = to.table_mut()?;
        check_length(
            "reference sigma_s",
            from_table.sigma_s_ref().len(),
            to_table.sigma_s_ref().len(),
        )?;
        to_table
            .sigma_s_ref_mut()
            .copy_from_slice(from_table.sigma_s_ref());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------

    fn table(&self) -> Result<&ReferenceTable> {
        self.reference
            .as_ref()
            .ok_or(Error::MissingDependency("group structure"))
    }

    fn table_mut(&mut self) -> Result<&mut ReferenceTable> {
        self.reference
            .as_mut()
            .ok_or(Error::MissingDependency("group structure"))
    }

    fn stepper(&self) -> Result<&Arc<dyn TimeStepper>> {
        self.stepper
            .as_ref()
            .ok_or(Error::MissingDependency("time stepper"))
    }

    fn precursors_ref(&self) -> Result<&PrecursorStore> {
        self.precursors
            .as_ref()
            .ok_or(Error::MissingDependency("precursor data"))
    }

    fn precursors_mut(&mut self) -> Result<&mut PrecursorStore> {
        self.precursors
            .as_mut()
            .ok_or(Error::MissingDependency("precursor data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stepper::StateClock;

    fn configured() -> FunctionalMaterial {
        let mut material = FunctionalMaterial::new(3);
        material.configure(2, 2).unwrap();
        material
    }

    #[test]
    fn defaults() {
        let material = FunctionalMaterial::new(3);
        assert_eq!(material.id(), 3);
        assert_eq!(material.num_groups(), 0);
        assert_eq!(material.num_time_steps(), 0);
        assert!(!material.sigma_a_func_temp());
        assert!(!material.sigma_a_func_time());
        assert!(!material.sigma_s_func_time());
        assert!(material.conserve_sigma_t());
        assert_eq!(material.temperature(State::Forward), 300.0);
        assert!(material.synced_state().is_none());
    }

    #[test]
    fn configure_once() {
        let mut material = configured();
        assert_eq!(material.gamma(), &[0.0, 0.0]);
        assert!(matches!(
            material.configure(3, 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert_eq!(material.num_groups(), 2);
    }

    #[test]
    fn configure_rejects_empty() {
        let mut material = FunctionalMaterial::new(0);
        assert!(material.configure(0, 2).is_err());
        assert!(material.configure(2, 0).is_err());
        assert!(material.reference().is_none());
    }

    #[test]
    fn ingestion_needs_configuration() {
        let mut material = FunctionalMaterial::new(0);
        assert!(matches!(
            material.set_sigma_a(&[0.1]),
            Err(Error::MissingDependency("group structure"))
        ));
    }

    #[test]
    fn static_paths_write_row_zero_and_working() {
        let mut material = configured();
        material.set_sigma_a(&[0.1, 0.2]).unwrap();
        material.set_sigma_s(&[0.5, 0.02, 0.0, 0.9]).unwrap();

        let table = material.reference().unwrap();
        assert_eq!(table.sigma_a_ref(), &[0.1, 0.2, 0.0, 0.0]);
        assert_eq!(table.sigma_s_at(0, 0, 1).unwrap(), 0.02);
        assert_eq!(material.base().sigma_a(), &[0.1, 0.2]);
        assert_eq!(material.base().scatter(0, 1).unwrap(), 0.02);
    }

    #[test]
    fn ingestion_invalidates_synced_state() {
        let mut material = FunctionalMaterial::new(3);
        material.configure(2, 1).unwrap();
        material.set_conserve_sigma_t(false);
        material.set_sigma_a(&[0.1, 0.2]).unwrap();

        material.sync(State::Current).unwrap();
        assert_eq!(material.synced_state(), Some(State::Current));
        material.set_sigma_a(&[0.9, 0.9]).unwrap();
        assert!(material.synced_state().is_none());

        material.sync(State::Current).unwrap();
        material.set_sigma_s(&[0.5, 0.02, 0.0, 0.9]).unwrap();
        assert!(material.synced_state().is_none());

        material.sync(State::Current).unwrap();
        material.set_sigma_a_time(1, &[0.3, 0.4]).unwrap();
        assert!(material.synced_state().is_none());

        material.sync(State::Current).unwrap();
        material.set_sigma_s_time(1, &[0.0; 4]).unwrap();
        assert!(material.synced_state().is_none());

        // re-syncing makes the working data consistent again
        material.sync(State::Current).unwrap();
        assert_eq!(material.base().sigma_t(), &[0.3, 0.4]);
    }

    #[test]
    fn failed_ingestion_keeps_synced_state() {
        let mut material = FunctionalMaterial::new(3);
        material.configure(2, 1).unwrap();
        material.set_conserve_sigma_t(false);
        material.sync(State::Forward).unwrap();

        assert!(material.set_sigma_a(&[0.1]).is_err());
        assert_eq!(material.synced_state(), Some(State::Forward));
    }

    #[test]
    fn failed_time_series_leaves_working_data() {
        let mut material = configured();
        material.set_sigma_a(&[0.1, 0.2]).unwrap();
        assert!(material.set_sigma_a_time(2, &[1.0, 2.0, 3.0]).is_err());
        assert!(material.set_sigma_s_time(2, &[1.0; 7]).is_err());
        assert_eq!(material.base().sigma_a(), &[0.1, 0.2]);
        assert_eq!(material.reference().unwrap().sigma_a_ref()[..2], [0.1, 0.2]);
    }

    #[test]
    fn absorption_series_seeds_leakage() {
        let mut material = configured();
        material.base_mut().set_dif_coef(&[1.0, 2.0]).unwrap();
        material.base_mut().set_buckling(&[0.5, 0.25]).unwrap();
        material
            .set_sigma_a_time(2, &[0.1, 0.2, 0.3, 0.4])
            .unwrap();
        assert_eq!(material.base().sigma_a(), &[0.1 + 0.5, 0.2 + 0.5]);
    }

    #[test]
    fn scatter_series_seeds_working_from_first_step() {
        let mut material = configured();
        material
            .set_sigma_s_time(2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
            .unwrap();
        assert_eq!(material.base().sigma_s(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn interpolation_needs_stepper() {
        let mut material = configured();
        material.set_time(&[0.0, 1.0]).unwrap();
        assert!(matches!(
            material.interpolate_sigma_a(State::Current, 0),
            Err(Error::MissingDependency("time stepper"))
        ));

        material.set_time_stepper(Arc::new(StateClock::new()));
        assert_eq!(material.interpolate_sigma_a(State::Current, 0).unwrap(), 0.0);
    }

    #[test]
    fn precursors_need_initialisation() {
        let mut material = configured();
        assert!(matches!(
            material.set_prec_conc(State::Current, 0, 1.0),
            Err(Error::MissingDependency(_))
        ));
        assert!(material.copy_prec_freq(State::Current, State::Forward).is_err());

        material.initialize_transient_props(2);
        material.set_prec_conc(State::Current, 1, 1.0).unwrap();
        assert_eq!(material.prec_conc(State::Current, 1).unwrap(), 1.0);
        assert_eq!(material.precursors().unwrap().num_delay_groups(), 2);
    }

    #[test]
    fn copy_plumbing_checks_dimensions() {
        let mut from = configured();
        from.set_sigma_s_time(2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
            .unwrap();

        let mut to = configured();
        to.set_conserve_sigma_t(false);
        to.sync(State::Current).unwrap();
        from.copy_sigma_s(&mut to).unwrap();
        assert!(to.synced_state().is_none());
        from.copy_sigma_s_ref(&mut to).unwrap();
        assert_eq!(to.base().sigma_s(), from.base().sigma_s());
        assert_eq!(
            to.reference().unwrap().sigma_s_ref(),
            from.reference().unwrap().sigma_s_ref()
        );

        let mut other = FunctionalMaterial::new(9);
        other.configure(3, 2).unwrap();
        assert!(from.copy_sigma_s(&mut other).is_err());
        assert!(from.copy_sigma_s_ref(&mut other).is_err());
    }
}
