//! JSON material definitions

// crate modules
use crate::error::{Error, Result};
use crate::functional::FunctionalMaterial;
use crate::material::check_length;
use crate::state::State;

// standard library
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

/// Serialisable definition of a [FunctionalMaterial]
///
/// Time dependent data are given as one row per tabulated time step. A single
/// row is always accepted and is loaded as static data for the first time
/// step only.
///
/// ```json
/// {
///     "id": 1,
///     "num_groups": 2,
///     "num_time_steps": 2,
///     "time": [0.0, 2.0],
///     "sigma_a": [[0.008252, 0.1003], [0.008252, 0.1]],
///     "sigma_s": [[0.0, 0.02533, 0.0, 0.0]],
///     "dif_coef": [1.255, 0.211],
///     "buckling": [1e-4, 1e-4],
///     "flags": { "sigma_a_func_time": true }
/// }
/// ```
///
/// - `sigma_a` rows hold `ng` values
/// - `sigma_s` rows hold `ng*ng` values in (from, to) order
/// - `temperature` (K) is applied to every state
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MaterialSpec {
    /// Material identifier
    pub id: u32,
    /// Number of energy groups
    pub num_groups: usize,
    /// Number of tabulated time steps
    #[serde(default = "single_step")]
    pub num_time_steps: usize,
    /// Tabulated times (s)
    #[serde(default)]
    pub time: Option<Vec<f64>>,
    /// Absorption (1/cm), one row per time step
    pub sigma_a: Vec<Vec<f64>>,
    /// Scattering (1/cm), one (from, to) block per time step
    #[serde(default)]
    pub sigma_s: Vec<Vec<f64>>,
    /// Fission (1/cm)
    #[serde(default)]
    pub sigma_f: Option<Vec<f64>>,
    /// Nu times fission (1/cm)
    #[serde(default)]
    pub nu_sigma_f: Option<Vec<f64>>,
    /// Fission spectrum
    #[serde(default)]
    pub chi: Option<Vec<f64>>,
    /// Diffusion coefficients (cm)
    #[serde(default)]
    pub dif_coef: Option<Vec<f64>>,
    /// Geometric buckling (1/cm^2)
    #[serde(default)]
    pub buckling: Option<Vec<f64>>,
    /// Temperature feedback coefficients
    #[serde(default)]
    pub gamma: Option<Vec<f64>>,
    /// Initial temperature (K) of every state
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Behaviour of the synchronisation
    #[serde(default)]
    pub flags: Flags,
}

/// Flags controlling what [FunctionalMaterial::sync()] recomputes
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Flags {
    /// Absorption depends on temperature
    pub sigma_a_func_temp: bool,
    /// Absorption depends on time
    pub sigma_a_func_time: bool,
    /// Scattering depends on time
    pub sigma_s_func_time: bool,
    /// Self-scatter is adjusted to conserve the total cross section
    pub conserve_sigma_t: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            sigma_a_func_temp: false,
            sigma_a_func_time: false,
            sigma_s_func_time: false,
            conserve_sigma_t: true,
        }
    }
}

fn single_step() -> usize {
    1
}

impl FunctionalMaterial {
    /// Build a material from its serialisable definition
    ///
    /// Every value goes through the usual validated setters, so any
    /// inconsistent dimension is reported as the corresponding error.
    pub fn from_spec(spec: &MaterialSpec) -> Result<Self> {
        let ng = spec.num_groups;
        let nt = spec.num_time_steps;

        let mut material = FunctionalMaterial::new(spec.id);
        material.configure(ng, nt)?;

        // static data first, absorption seeding depends on the leakage terms
        let base = material.base_mut();
        if let Some(xs) = &spec.sigma_f {
            base.set_sigma_f(xs)?;
        }
        if let Some(xs) = &spec.nu_sigma_f {
            base.set_nu_sigma_f(xs)?;
        }
        if let Some(xs) = &spec.chi {
            base.set_chi(xs)?;
        }
        if let Some(dif_coef) = &spec.dif_coef {
            base.set_dif_coef(dif_coef)?;
        }
        if let Some(buckling) = &spec.buckling {
            base.set_buckling(buckling)?;
        }

        if let Some(time) = &spec.time {
            material.set_time(time)?;
        }

        match check_rows("sigma_a", &spec.sigma_a, ng, nt)? {
            Rows::Static(row) => material.set_sigma_a(row)?,
            Rows::Series(xs) => material.set_sigma_a_time(nt, &xs)?,
            Rows::Empty => return Err(Error::MissingDependency("sigma_a")),
        }

        match check_rows("sigma_s", &spec.sigma_s, ng * ng, nt)? {
            Rows::Static(row) => material.set_sigma_s(row)?,
            Rows::Series(xs) => material.set_sigma_s_time(nt, &xs)?,
            Rows::Empty => debug!("No scattering given for material {}", spec.id),
        }

        if let Some(gamma) = &spec.gamma {
            material.set_gamma(gamma)?;
        }
        if let Some(temperature) = spec.temperature {
            for state in State::ALL {
                material.set_temperature(state, temperature);
            }
        }

        material.set_sigma_a_func_temp(spec.flags.sigma_a_func_temp);
        material.set_sigma_a_func_time(spec.flags.sigma_a_func_time);
        material.set_sigma_s_func_time(spec.flags.sigma_s_func_time);
        material.set_conserve_sigma_t(spec.flags.conserve_sigma_t);

        Ok(material)
    }
}

/// Read a named collection of material definitions from JSON
///
/// The file is a single object mapping region names to [MaterialSpec]
/// definitions.
///
/// ```rust, no_run
/// # use ktools_material::read_json;
/// let materials = read_json("path/to/materials.json").unwrap();
/// let region = &materials["region_1"];
/// ```
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, FunctionalMaterial>> {
    let path: &Path = Path::new(path.as_ref());
    debug!("Reading material definitions from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let specs: BTreeMap<String, MaterialSpec> = serde_json::from_reader(reader)?;

    specs
        .iter()
        .map(|(name, spec)| Ok((name.clone(), FunctionalMaterial::from_spec(spec)?)))
        .collect()
}

/// Validated shape of per-time-step rows
enum Rows<'a> {
    Empty,
    Static(&'a [f64]),
    Series(Vec<f64>),
}

fn check_rows<'a>(
    quantity: &'static str,
    rows: &'a [Vec<f64>],
    row_len: usize,
    num_time_steps: usize,
) -> Result<Rows<'a>> {
    let len = match rows.iter().map(Vec::len).all_equal_value() {
        Ok(len) => len,
        Err(Some((expected, found))) => {
            return Err(Error::DimensionMismatch {
                quantity,
                expected,
                found,
            })
        }
        Err(None) => return Ok(Rows::Empty),
    };
    check_length(quantity, row_len, len)?;

    match rows.len() {
        1 => Ok(Rows::Static(&rows[0])),
        n => {
            check_length(quantity, num_time_steps, n)?;
            Ok(Rows::Series(rows.concat()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GROUP: &str = r#"{
        "id": 4,
        "num_groups": 2,
        "num_time_steps": 2,
        "time": [0.0, 10.0],
        "sigma_a": [[0.1, 0.2], [0.3, 0.4]],
        "sigma_s": [[0.5, 0.02, 0.0, 0.9]],
        "dif_coef": [1.5, 0.4],
        "buckling": [1e-4, 1e-4],
        "gamma": [0.0, 0.003],
        "temperature": 350.0,
        "flags": { "sigma_a_func_time": true, "sigma_a_func_temp": true }
    }"#;

    #[test]
    fn flags_default_to_conserving() {
        let flags: Flags = serde_json::from_str("{}").unwrap();
        assert_eq!(flags, Flags::default());
        assert!(flags.conserve_sigma_t);
    }

    #[test]
    fn from_spec_applies_everything() {
        let spec: MaterialSpec = serde_json::from_str(TWO_GROUP).unwrap();
        let material = FunctionalMaterial::from_spec(&spec).unwrap();

        assert_eq!(material.id(), 4);
        assert_eq!(material.num_time_steps(), 2);
        assert_eq!(material.time(), Some(&[0.0, 10.0][..]));
        assert_eq!(material.gamma(), &[0.0, 0.003]);
        assert_eq!(material.temperature(State::Shape), 350.0);
        assert!(material.sigma_a_func_time());
        assert!(material.sigma_a_func_temp());
        assert!(!material.sigma_s_func_time());
        assert!(material.conserve_sigma_t());

        let table = material.reference().unwrap();
        assert_eq!(table.sigma_a_at(1, 1).unwrap(), 0.4);
        assert_eq!(table.sigma_s_at(0, 0, 1).unwrap(), 0.02);
    }

    #[test]
    fn ragged_rows_rejected() {
        let mut spec: MaterialSpec = serde_json::from_str(TWO_GROUP).unwrap();
        spec.sigma_a = vec![vec![0.1, 0.2], vec![0.3]];
        assert!(matches!(
            FunctionalMaterial::from_spec(&spec),
            Err(Error::DimensionMismatch {
                quantity: "sigma_a",
                expected: 2,
                found: 1,
            })
        ));
    }

    #[test]
    fn wrong_number_of_rows_rejected() {
        let mut spec: MaterialSpec = serde_json::from_str(TWO_GROUP).unwrap();
        spec.sigma_a = vec![vec![0.1, 0.2]; 3];
        assert!(FunctionalMaterial::from_spec(&spec).is_err());
    }

    #[test]
    fn absorption_is_required() {
        let mut spec: MaterialSpec = serde_json::from_str(TWO_GROUP).unwrap();
        spec.sigma_a.clear();
        assert!(matches!(
            FunctionalMaterial::from_spec(&spec),
            Err(Error::MissingDependency("sigma_a"))
        ));
    }
}
