//! Plain multigroup cross section storage

// crate modules
use crate::error::{Error, Result};

// ktools modules
use ktools_utils::SliceExt;

use log::warn;

/// Multigroup macroscopic cross sections for a single material region
///
/// This is the storage shared between the kinetics material data and the
/// solvers that consume it. Every array has one entry per energy group,
/// apart from the scattering matrix which has `ng*ng` entries.
///
/// ## Scattering orientation
///
/// Inputs are always given in (from, to) order, i.e. `xs[from*ng + to]`.
///
/// Internally the matrix is held in (to, from) order so that the column
/// `sigma_s[to*ng + from]` over all `to` is the scattering out of group `from`.
/// Use [Material::scatter()] to read a value without caring about the layout.
///
/// ```rust
/// # use ktools_material::Material;
/// let mut material = Material::new(1);
/// material.set_num_energy_groups(2);
///
/// // 0->1 down-scatter only
/// material.set_sigma_s(&[0.5, 0.02, 0.0, 0.9]).unwrap();
///
/// assert_eq!(material.scatter(0, 1).unwrap(), 0.02);
/// assert_eq!(material.scatter(1, 0).unwrap(), 0.0);
///
/// // Groups outside the structure are rejected
/// assert!(material.scatter(2, 0).is_err());
/// assert_eq!(material.sigma_s()[1 * 2 + 0], 0.02);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    id: u32,
    num_groups: usize,
    sigma_t: Vec<f64>,
    sigma_a: Vec<f64>,
    sigma_s: Vec<f64>,
    sigma_f: Vec<f64>,
    nu_sigma_f: Vec<f64>,
    chi: Vec<f64>,
    buckling: Option<Vec<f64>>,
    dif_coef: Option<Vec<f64>>,
}

impl Material {
    /// New empty material with the given identifier
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Material identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of energy groups
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Allocate zeroed storage for `num_groups` energy groups
    ///
    /// Any optional diffusion data are dropped, since they would no longer be
    /// consistent with the group structure.
    pub fn set_num_energy_groups(&mut self, num_groups: usize) {
        self.num_groups = num_groups;
        self.sigma_t = vec![0.0; num_groups];
        self.sigma_a = vec![0.0; num_groups];
        self.sigma_s = vec![0.0; num_groups * num_groups];
        self.sigma_f = vec![0.0; num_groups];
        self.nu_sigma_f = vec![0.0; num_groups];
        self.chi = vec![0.0; num_groups];
        self.buckling = None;
        self.dif_coef = None;
    }

    /// Set total cross sections (1/cm)
    pub fn set_sigma_t(&mut self, xs: &[f64]) -> Result<()> {
        check_length("sigma_t", self.num_groups, xs.len())?;
        self.sigma_t.copy_from_slice(xs);
        Ok(())
    }

    /// Set absorption cross sections (1/cm)
    pub fn set_sigma_a(&mut self, xs: &[f64]) -> Result<()> {
        check_length("sigma_a", self.num_groups, xs.len())?;
        self.sigma_a.copy_from_slice(xs);
        Ok(())
    }

    /// Set the scattering matrix (1/cm) from values in (from, to) order
    pub fn set_sigma_s(&mut self, xs: &[f64]) -> Result<()> {
        let ng = self.num_groups;
        check_length("sigma_s", ng * ng, xs.len())?;
        self.sigma_s = transpose_block(xs, ng)?;
        Ok(())
    }

    /// Set fission cross sections (1/cm)
    pub fn set_sigma_f(&mut self, xs: &[f64]) -> Result<()> {
        check_length("sigma_f", self.num_groups, xs.len())?;
        self.sigma_f.copy_from_slice(xs);
        Ok(())
    }

    /// Set nu times the fission cross sections (1/cm)
    pub fn set_nu_sigma_f(&mut self, xs: &[f64]) -> Result<()> {
        check_length("nu_sigma_f", self.num_groups, xs.len())?;
        self.nu_sigma_f.copy_from_slice(xs);
        Ok(())
    }

    /// Set the fission spectrum
    pub fn set_chi(&mut self, xs: &[f64]) -> Result<()> {
        check_length("chi", self.num_groups, xs.len())?;
        self.chi.copy_from_slice(xs);
        Ok(())
    }

    /// Set the geometric buckling (1/cm^2) for each group
    pub fn set_buckling(&mut self, buckling: &[f64]) -> Result<()> {
        check_length("buckling", self.num_groups, buckling.len())?;
        self.buckling = Some(buckling.to_vec());
        Ok(())
    }

    /// Set the diffusion coefficient (cm) for each group
    pub fn set_dif_coef(&mut self, dif_coef: &[f64]) -> Result<()> {
        check_length("diffusion coefficient", self.num_groups, dif_coef.len())?;
        if dif_coef.iter().any(|d| *d <= 0.0) {
            warn!(
                "Non-positive diffusion coefficient for material {}: {:?}",
                self.id, dif_coef
            );
        }
        self.dif_coef = Some(dif_coef.to_vec());
        Ok(())
    }

    /// Total cross sections (1/cm)
    pub fn sigma_t(&self) -> &[f64] {
        &self.sigma_t
    }

    /// Absorption cross sections (1/cm)
    pub fn sigma_a(&self) -> &[f64] {
        &self.sigma_a
    }

    /// Raw scattering matrix (1/cm) in (to, from) order
    pub fn sigma_s(&self) -> &[f64] {
        &self.sigma_s
    }

    /// Scattering cross section (1/cm) from one group to another
    pub fn scatter(&self, from: usize, to: usize) -> Result<f64> {
        check_group(from, self.num_groups)?;
        check_group(to, self.num_groups)?;
        Ok(self.sigma_s[to * self.num_groups + from])
    }

    /// Fission cross sections (1/cm)
    pub fn sigma_f(&self) -> &[f64] {
        &self.sigma_f
    }

    /// Nu times the fission cross sections (1/cm)
    pub fn nu_sigma_f(&self) -> &[f64] {
        &self.nu_sigma_f
    }

    /// Fission spectrum
    pub fn chi(&self) -> &[f64] {
        &self.chi
    }

    /// Geometric buckling (1/cm^2), if set
    pub fn buckling(&self) -> Option<&[f64]> {
        self.buckling.as_deref()
    }

    /// Diffusion coefficient (cm), if set
    pub fn dif_coef(&self) -> Option<&[f64]> {
        self.dif_coef.as_deref()
    }

    /// Mutable view of the total cross sections
    pub fn sigma_t_mut(&mut self) -> &mut [f64] {
        &mut self.sigma_t
    }

    /// Mutable view of the absorption cross sections
    pub fn sigma_a_mut(&mut self) -> &mut [f64] {
        &mut self.sigma_a
    }

    /// Mutable view of the raw (to, from) scattering matrix
    pub fn sigma_s_mut(&mut self) -> &mut [f64] {
        &mut self.sigma_s
    }
}

/// Fail with a dimension mismatch unless the lengths agree
pub(crate) fn check_length(quantity: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::DimensionMismatch {
            quantity,
            expected,
            found,
        });
    }
    Ok(())
}

/// Fail with an out of range error unless `group < num_groups`
pub(crate) fn check_group(group: usize, num_groups: usize) -> Result<()> {
    if group >= num_groups {
        return Err(Error::OutOfRange {
            quantity: "energy group",
            index: group,
            bound: num_groups,
        });
    }
    Ok(())
}

/// Transpose a (from, to) block into (to, from) order
pub(crate) fn transpose_block(xs: &[f64], num_groups: usize) -> Result<Vec<f64>> {
    xs.transpose_square(num_groups)
        .map_err(|_| Error::DimensionMismatch {
            quantity: "scattering block",
            expected: num_groups * num_groups,
            found: xs.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_group() -> Material {
        let mut material = Material::new(7);
        material.set_num_energy_groups(2);
        material
    }

    #[test]
    fn allocation_zeroes_everything() {
        let material = two_group();
        assert_eq!(material.id(), 7);
        assert_eq!(material.sigma_t(), &[0.0, 0.0]);
        assert_eq!(material.sigma_s(), &[0.0; 4]);
        assert!(material.buckling().is_none());
        assert!(material.dif_coef().is_none());
    }

    #[test]
    fn setters_reject_wrong_lengths() {
        let mut material = two_group();
        assert!(matches!(
            material.set_sigma_a(&[0.1, 0.2, 0.3]),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));
        assert!(material.set_sigma_s(&[0.1, 0.2]).is_err());
        assert!(material.set_dif_coef(&[1.0]).is_err());

        // nothing was written by the failed calls
        assert_eq!(material.sigma_a(), &[0.0, 0.0]);
        assert!(material.dif_coef().is_none());
    }

    #[test]
    fn scatter_is_stored_to_from() {
        let mut material = two_group();
        material.set_sigma_s(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(material.sigma_s(), &[1.0, 3.0, 2.0, 4.0]);
        assert_eq!(material.scatter(0, 1).unwrap(), 2.0);
        assert_eq!(material.scatter(1, 0).unwrap(), 3.0);
    }

    #[test]
    fn scatter_rejects_groups_outside_structure() {
        let mut material = two_group();
        material.set_sigma_s(&[1.0, 2.0, 3.0, 4.0]).unwrap();

        // from=2 would otherwise alias the (from=0, to=1) entry
        assert!(matches!(
            material.scatter(2, 0),
            Err(Error::OutOfRange {
                quantity: "energy group",
                index: 2,
                bound: 2,
            })
        ));
        assert!(material.scatter(0, 2).is_err());
        assert!(Material::new(1).scatter(0, 0).is_err());
    }

    #[test]
    fn regrouping_drops_diffusion_data() {
        let mut material = two_group();
        material.set_buckling(&[1e-4, 1e-4]).unwrap();
        material.set_num_energy_groups(3);
        assert!(material.buckling().is_none());
        assert_eq!(material.sigma_s().len(), 9);
    }
}
