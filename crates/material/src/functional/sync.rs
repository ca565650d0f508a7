//! Synchronisation of the working cross sections to a state

// crate modules
use crate::error::{Error, Result};
use crate::functional::FunctionalMaterial;
use crate::state::State;

use log::{debug, trace};
use rayon::prelude::*;

/// Working cross sections evaluated for a single state
struct Evaluated {
    sigma_a: Vec<f64>,
    sigma_s: Vec<f64>,
    sigma_t: Vec<f64>,
}

impl FunctionalMaterial {
    /// Recompute the working cross sections for a state
    ///
    /// For every group `g`, absorption is taken from the first time step or
    /// interpolated in time, then multiplied by the temperature feedback if
    /// enabled.
    ///
    /// **Conserving** (`conserve_sigma_t`), with diffusion coefficient `D` and
    /// buckling `B`:
    ///
    /// ```text
    /// out[g]       = sum of sigma_s[g->G] for G != g   (working values)
    /// sigma_s[g,g] = 1/(3 D[g]) - sigma_a[g] - out[g]
    /// sigma_a[g]  += D[g] B[g]
    /// sigma_t[g]   = sigma_a[g] + out[g] + sigma_s[g,g]
    /// ```
    ///
    /// **Non-conserving**: scattering out of `g` is optionally interpolated
    /// in time, then `sigma_t[g] = sigma_a[g] + sum of sigma_s[g->G]`.
    ///
    /// Every dependency is checked before anything is written, so on error
    /// the working cross sections are left exactly as they were.
    pub fn sync(&mut self, state: State) -> Result<()> {
        let evaluated = self.evaluate(state)?;

        let base = self.base_mut();
        base.sigma_a_mut().copy_from_slice(&evaluated.sigma_a);
        base.sigma_s_mut().copy_from_slice(&evaluated.sigma_s);
        base.sigma_t_mut().copy_from_slice(&evaluated.sigma_t);
        self.synced_state = Some(state);

        debug!("Synchronised material {} to {state}", self.id());
        Ok(())
    }

    fn evaluate(&self, state: State) -> Result<Evaluated> {
        let table = self.table()?;
        let ng = table.num_groups();

        // time is only needed if something is actually interpolated
        let interpolate_s = self.sigma_s_func_time && !self.conserve_sigma_t;
        let time = if self.sigma_a_func_time || interpolate_s {
            table.check_time_mesh()?;
            Some(self.stepper()?.time(state))
        } else {
            None
        };

        let diffusion = if self.conserve_sigma_t {
            let dif_coef = self
                .base
                .dif_coef()
                .ok_or(Error::MissingDependency("diffusion coefficient"))?;
            let buckling = self
                .base
                .buckling()
                .ok_or(Error::MissingDependency("buckling"))?;
            Some((dif_coef, buckling))
        } else {
            None
        };

        let mut sigma_a = vec![0.0; ng];
        let mut sigma_s = self.base.sigma_s().to_vec();
        let mut sigma_t = vec![0.0; ng];

        for g in 0..ng {
            let mut xs_a = match time {
                Some(t) if self.sigma_a_func_time => table.interpolate_sigma_a(t, g)?,
                _ => table.sigma_a_ref()[g],
            };

            if self.sigma_a_func_temp {
                xs_a *= self.temperature.feedback_multiplier(g, state)?;
            }

            match diffusion {
                Some((dif_coef, buckling)) => {
                    // column g without the diagonal, i.e. scattering out of g
                    let out: f64 = (0..ng)
                        .filter(|&to| to != g)
                        .map(|to| sigma_s[to * ng + g])
                        .sum();

                    let self_scatter = 1.0 / (3.0 * dif_coef[g]) - xs_a - out;
                    sigma_s[g * ng + g] = self_scatter;

                    xs_a += dif_coef[g] * buckling[g];
                    sigma_t[g] = xs_a + out + self_scatter;
                }
                None => {
                    if let (true, Some(t)) = (interpolate_s, time) {
                        for to in 0..ng {
                            sigma_s[to * ng + g] = table.interpolate_sigma_s(t, g, to)?;
                        }
                    }
                    let column: f64 = (0..ng).map(|to| sigma_s[to * ng + g]).sum();
                    sigma_t[g] = xs_a + column;
                }
            }

            trace!(
                "  group {g}: sigma_a={:.5e} sigma_t={:.5e}",
                xs_a,
                sigma_t[g]
            );
            sigma_a[g] = xs_a;
        }

        Ok(Evaluated {
            sigma_a,
            sigma_s,
            sigma_t,
        })
    }
}

/// Synchronise many material regions to the same state in parallel
///
/// Each region only touches its own arrays. The time of `state` must be
/// final before this is called, since every region reads it from the shared
/// time stepper.
///
/// Stops at the first failure. Regions that were already synchronised are
/// not rolled back, but each individual region is either fully synchronised
/// or untouched.
pub fn sync_all(materials: &mut [FunctionalMaterial], state: State) -> Result<()> {
    debug!("Synchronising {} materials to {state}", materials.len());
    materials
        .par_iter_mut()
        .try_for_each(|material| material.sync(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stepper::StateClock;

    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn two_group(clock: Arc<StateClock>) -> FunctionalMaterial {
        let mut material = FunctionalMaterial::new(1);
        material.configure(2, 2).unwrap();
        material.set_time(&[0.0, 10.0]).unwrap();
        material.set_sigma_a_time(2, &[0.1, 0.2, 0.3, 0.4]).unwrap();
        material
            .set_sigma_s_time(2, &[0.5, 0.02, 0.0, 0.9, 0.7, 0.06, 0.0, 1.1])
            .unwrap();
        material.set_time_stepper(clock);
        material
    }

    #[test]
    fn static_absorption_ignores_time() {
        let clock = Arc::new(StateClock::new());
        clock.set_time(State::Current, 5.0);
        let mut material = two_group(clock);
        material.set_conserve_sigma_t(false);

        material.sync(State::Current).unwrap();
        assert_eq!(material.base().sigma_a(), &[0.1, 0.2]);
        // working scatter unchanged, column sums out of each group
        assert_abs_diff_eq!(material.base().sigma_t()[0], 0.52 + 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(material.base().sigma_t()[1], 0.9 + 0.2, epsilon = 1e-12);
    }

    #[test]
    fn scattering_interpolated_without_conservation() {
        let clock = Arc::new(StateClock::new());
        clock.set_time(State::Forward, 5.0);
        let mut material = two_group(clock);
        material.set_conserve_sigma_t(false);
        material.set_sigma_s_func_time(true);

        material.sync(State::Forward).unwrap();
        assert_abs_diff_eq!(material.base().scatter(0, 0).unwrap(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(material.base().scatter(0, 1).unwrap(), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(material.base().scatter(1, 1).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(material.base().sigma_t()[0], 0.1 + 0.64, epsilon = 1e-12);
        assert_eq!(material.synced_state(), Some(State::Forward));
    }

    #[test]
    fn conserving_requires_diffusion_data() {
        let clock = Arc::new(StateClock::new());
        let mut material = two_group(clock);
        let before = material.base().clone();

        assert!(matches!(
            material.sync(State::Current),
            Err(Error::MissingDependency("diffusion coefficient"))
        ));
        material.base_mut().set_dif_coef(&[1.5, 0.4]).unwrap();
        assert!(matches!(
            material.sync(State::Current),
            Err(Error::MissingDependency("buckling"))
        ));

        // nothing was written by the failed attempts
        assert_eq!(material.base().sigma_s(), before.sigma_s());
        assert_eq!(material.base().sigma_t(), before.sigma_t());
        assert!(material.synced_state().is_none());
    }

    #[test]
    fn time_interpolation_requires_stepper() {
        let mut material = FunctionalMaterial::new(1);
        material.configure(1, 2).unwrap();
        material.set_time(&[0.0, 1.0]).unwrap();
        material.set_conserve_sigma_t(false);
        material.set_sigma_a_func_time(true);
        assert!(matches!(
            material.sync(State::Current),
            Err(Error::MissingDependency("time stepper"))
        ));
    }

    #[test]
    fn unconfigured_sync_fails() {
        let mut material = FunctionalMaterial::new(1);
        assert!(material.sync(State::Current).is_err());
    }

    #[test]
    fn parallel_sync_matches_serial() {
        let clock = Arc::new(StateClock::new());
        clock.set_time(State::Current, 2.5);

        let mut materials: Vec<FunctionalMaterial> = (0..8)
            .map(|i| {
                let mut m = two_group(clock.clone());
                m.set_conserve_sigma_t(false);
                m.set_sigma_a_func_time(true);
                m.set_temperature(State::Current, 300.0 + 50.0 * i as f64);
                m.set_sigma_a_func_temp(true);
                m.set_gamma(&[0.01, 0.02]).unwrap();
                m
            })
            .collect();
        let mut serial = materials.clone();

        sync_all(&mut materials, State::Current).unwrap();
        for m in serial.iter_mut() {
            m.sync(State::Current).unwrap();
        }

        for (a, b) in materials.iter().zip(serial.iter()) {
            assert_eq!(a.base().sigma_a(), b.base().sigma_a());
            assert_eq!(a.base().sigma_t(), b.base().sigma_t());
        }
    }
}
