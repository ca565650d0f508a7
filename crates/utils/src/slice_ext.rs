use crate::error::{Error, Result};

/// Extends functionality for slices of float arrays
pub trait SliceExt<T> {
    /// Check that every value is finite and larger than the one before it
    ///
    /// Empty slices and single values are trivially increasing.
    ///
    /// ```rust
    /// # use ktools_utils::SliceExt;
    /// assert!([0.0_f64, 1.0, 2.5].is_strictly_increasing());
    /// assert!([4.0_f64].is_strictly_increasing());
    ///
    /// // Repeated values and undefined values fail
    /// assert!(![0.0_f64, 1.0, 1.0].is_strictly_increasing());
    /// assert!(![0.0_f64, f64::NAN].is_strictly_increasing());
    /// ```
    fn is_strictly_increasing(&self) -> bool;

    /// Find the first upper bracket index for `value` on an ascending mesh
    ///
    /// Scans `i = 1..len` in increasing order and returns the first `i` where
    /// `value < self[i] + tol`. The bracketing interval is then
    /// `self[i-1]..self[i]`.
    ///
    /// Returns `None` if no such index exists, which is the case for values
    /// beyond the last mesh point (plus `tol`), or for meshes with fewer than 2
    /// points.
    ///
    /// Note there is no lower bound check. Anything below `self[1]` is
    /// bracketed by the first interval.
    ///
    /// ```rust
    /// # use ktools_utils::SliceExt;
    /// let times: Vec<f64> = vec![0.0, 10.0, 20.0];
    ///
    /// assert_eq!(times.find_upper_bracket(5.0, 1e-8), Some(1));
    /// assert_eq!(times.find_upper_bracket(-5.0, 1e-8), Some(1));
    /// assert_eq!(times.find_upper_bracket(15.0, 1e-8), Some(2));
    ///
    /// // The last edge closes the last interval, anything beyond is unbracketed
    /// assert_eq!(times.find_upper_bracket(20.0, 1e-8), Some(2));
    /// assert_eq!(times.find_upper_bracket(20.1, 1e-8), None);
    /// assert_eq!(vec![0.0_f64].find_upper_bracket(0.0, 1e-8), None);
    /// ```
    fn find_upper_bracket(&self, value: T, tol: T) -> Option<usize>;

    /// Transpose a flattened square block of `order` x `order` values
    ///
    /// Entry `[i*order + j]` of the input ends up at `[j*order + i]` of the
    /// output.
    ///
    /// ```rust
    /// # use ktools_utils::SliceExt;
    /// # use ktools_utils::Error;
    /// let block: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
    /// assert_eq!(block.transpose_square(2), Ok(vec![1.0, 3.0, 2.0, 4.0]));
    ///
    /// // The length must match the order
    /// assert_eq!(
    ///     block.transpose_square(3),
    ///     Err(Error::NotSquare { length: 4, order: 3 })
    /// );
    /// ```
    fn transpose_square(&self, order: usize) -> Result<Vec<T>>;
}

impl SliceExt<f64> for [f64] {
    fn is_strictly_increasing(&self) -> bool {
        if self.iter().any(|v| !v.is_finite()) {
            return false;
        }
        self.windows(2).all(|w| w[0] < w[1])
    }

    fn find_upper_bracket(&self, value: f64, tol: f64) -> Option<usize> {
        (1..self.len()).find(|&i| value < self[i] + tol)
    }

    fn transpose_square(&self, order: usize) -> Result<Vec<f64>> {
        if self.len() != order * order {
            return Err(Error::NotSquare {
                length: self.len(),
                order,
            });
        }

        let mut transposed = vec![0.0; self.len()];
        for i in 0..order {
            for j in 0..order {
                transposed[j * order + i] = self[i * order + j];
            }
        }
        Ok(transposed)
    }
}
