//! Tabulated cross sections over the time mesh

// crate modules
use crate::error::{Error, Result};
use crate::material::{check_group, check_length, transpose_block};

// ktools modules
use ktools_utils::{f, SliceExt};

use log::{debug, trace};

/// Times within this tolerance of a mesh point close the interval below it
pub const TIME_TOLERANCE: f64 = 1e-8;

/// Reference cross sections tabulated on a discrete time mesh
///
/// Absorption data are stored time-major, with entry `(t, g)` at index
/// `t*ng + g`.
///
/// Scattering data are stored as one (to, from) block per time step, with
/// entry `(t, to, from)` at index `t*ng*ng + to*ng + from`. All inputs are
/// given in the natural (from, to) order and transposed on the way in.
///
/// ## Interpolation
///
/// For a time `t`, the tabulated times are scanned in increasing order from
/// the second point. At the first point `i` where `t < time[i] + 1e-8` the
/// value is linearly interpolated between steps `i-1` and `i`.
///
/// If there is no such point, the value from the **first** time step is
/// returned. This left-clamp fallback applies to any time beyond the end of
/// the mesh and to single step tables. It is not an extrapolation.
///
/// ```rust
/// # use ktools_material::ReferenceTable;
/// let mut table = ReferenceTable::new(1, 2);
/// table.set_time(&[0.0, 10.0]).unwrap();
/// table.set_sigma_a_time(2, &[1.0, 3.0]).unwrap();
///
/// assert_eq!(table.interpolate_sigma_a(5.0, 0).unwrap(), 2.0);
/// assert_eq!(table.interpolate_sigma_a(10.0, 0).unwrap(), 3.0);
///
/// // Beyond the last tabulated time falls back to the first step
/// assert_eq!(table.interpolate_sigma_a(50.0, 0).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceTable {
    num_groups: usize,
    num_time_steps: usize,
    sigma_a_ref: Vec<f64>,
    sigma_s_ref: Vec<f64>,
    time: Option<Vec<f64>>,
}

impl ReferenceTable {
    /// Zeroed tables for `num_groups` groups over `num_time_steps` steps
    pub fn new(num_groups: usize, num_time_steps: usize) -> Self {
        debug!("Allocating reference tables: {num_groups} groups, {num_time_steps} time steps");
        Self {
            num_groups,
            num_time_steps,
            sigma_a_ref: vec![0.0; num_groups * num_time_steps],
            sigma_s_ref: vec![0.0; num_groups * num_groups * num_time_steps],
            time: None,
        }
    }

    /// Number of energy groups
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Number of tabulated time steps
    pub fn num_time_steps(&self) -> usize {
        self.num_time_steps
    }

    /// Set the tabulated times (s)
    ///
    /// There must be one strictly increasing value per time step.
    pub fn set_time(&mut self, time: &[f64]) -> Result<()> {
        check_length("time", self.num_time_steps, time.len())?;
        if !time.is_strictly_increasing() {
            return Err(Error::InvalidConfiguration(f!(
                "tabulated times must be strictly increasing, found {time:?}"
            )));
        }
        self.time = Some(time.to_vec());
        Ok(())
    }

    /// Tabulated times (s), if set
    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    /// Full absorption table, time-major
    pub fn sigma_a_ref(&self) -> &[f64] {
        &self.sigma_a_ref
    }

    /// Full scattering table, one (to, from) block per time step
    pub fn sigma_s_ref(&self) -> &[f64] {
        &self.sigma_s_ref
    }

    /// Mutable view of the full scattering table
    pub fn sigma_s_ref_mut(&mut self) -> &mut [f64] {
        &mut self.sigma_s_ref
    }

    /// Tabulated absorption at a time step and group
    pub fn sigma_a_at(&self, step: usize, group: usize) -> Result<f64> {
        self.check_step(step)?;
        self.check_group(group)?;
        Ok(self.sigma_a_ref[step * self.num_groups + group])
    }

    /// Tabulated scattering at a time step, from one group to another
    pub fn sigma_s_at(&self, step: usize, from: usize, to: usize) -> Result<f64> {
        self.check_step(step)?;
        self.check_group(from)?;
        self.check_group(to)?;
        Ok(self.sigma_s_ref[self.scatter_index(step, from, to)])
    }

    /// Set the absorption for the first time step only
    pub fn set_sigma_a(&mut self, xs: &[f64]) -> Result<()> {
        check_length("sigma_a", self.num_groups, xs.len())?;
        self.sigma_a_ref[..self.num_groups].copy_from_slice(xs);
        Ok(())
    }

    /// Set the scattering for the first time step only, in (from, to) order
    pub fn set_sigma_s(&mut self, xs: &[f64]) -> Result<()> {
        let block = self.num_groups * self.num_groups;
        check_length("sigma_s", block, xs.len())?;
        let transposed = transpose_block(xs, self.num_groups)?;
        self.sigma_s_ref[..block].copy_from_slice(&transposed);
        Ok(())
    }

    /// Set the absorption for every time step
    ///
    /// Values are already time-major and are copied verbatim.
    pub fn set_sigma_a_time(&mut self, num_time_steps: usize, xs: &[f64]) -> Result<()> {
        check_length("time steps", self.num_time_steps, num_time_steps)?;
        check_length(
            "sigma_a time series",
            self.num_time_steps * self.num_groups,
            xs.len(),
        )?;
        self.sigma_a_ref.copy_from_slice(xs);
        Ok(())
    }

    /// Set the scattering for every time step
    ///
    /// Each time step is a (from, to) block of `ng*ng` values, transposed
    /// independently.
    pub fn set_sigma_s_time(&mut self, num_time_steps: usize, xs: &[f64]) -> Result<()> {
        check_length("time steps", self.num_time_steps, num_time_steps)?;

        // infer the group count from a single block
        let len_sq = xs.len() / num_time_steps.max(1);
        let inferred = (len_sq as f64).sqrt().round() as usize;
        check_length("sigma_s groups", self.num_groups, inferred)?;

        let block = self.num_groups * self.num_groups;
        check_length("sigma_s time series", self.num_time_steps * block, xs.len())?;

        let mut table = Vec::with_capacity(xs.len());
        for chunk in xs.chunks_exact(block.max(1)) {
            table.extend(transpose_block(chunk, self.num_groups)?);
        }
        self.sigma_s_ref = table;
        Ok(())
    }

    /// Absorption interpolated to time `t` (s)
    pub fn interpolate_sigma_a(&self, t: f64, group: usize) -> Result<f64> {
        self.check_group(group)?;
        self.interpolate(t, self.num_groups, group, &self.sigma_a_ref)
    }

    /// Scattering from one group to another interpolated to time `t` (s)
    pub fn interpolate_sigma_s(&self, t: f64, from: usize, to: usize) -> Result<f64> {
        self.check_group(from)?;
        self.check_group(to)?;
        let block = self.num_groups * self.num_groups;
        self.interpolate(t, block, to * self.num_groups + from, &self.sigma_s_ref)
    }

    /// Fail early if interpolation would need a time mesh that is not set
    pub(crate) fn check_time_mesh(&self) -> Result<()> {
        if self.num_time_steps > 1 && self.time.is_none() {
            return Err(Error::MissingDependency("tabulated time mesh"));
        }
        Ok(())
    }

    /// Shared interpolation over `values[step*stride + offset]`
    fn interpolate(&self, t: f64, stride: usize, offset: usize, values: &[f64]) -> Result<f64> {
        self.check_time_mesh()?;

        // single step tables never need the time mesh
        let bracket = match &self.time {
            Some(time) => time
                .find_upper_bracket(t, TIME_TOLERANCE)
                .map(|i| (i, time[i - 1], time[i])),
            None => None,
        };

        let Some((i, t0, t1)) = bracket else {
            trace!("t={t:.5e} is not bracketed, using first time step");
            return Ok(values[offset]);
        };

        let v0 = values[(i - 1) * stride + offset];
        let v1 = values[i * stride + offset];
        Ok(v0 + (t - t0) / (t1 - t0) * (v1 - v0))
    }

    fn scatter_index(&self, step: usize, from: usize, to: usize) -> usize {
        let ng = self.num_groups;
        step * ng * ng + to * ng + from
    }

    fn check_group(&self, group: usize) -> Result<()> {
        check_group(group, self.num_groups)
    }

    fn check_step(&self, step: usize) -> Result<()> {
        if step >= self.num_time_steps {
            return Err(Error::OutOfRange {
                quantity: "time step",
                index: step,
                bound: self.num_time_steps,
            });
        }
        Ok(())
    }
}
