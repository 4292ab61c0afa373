//! Bootstrap resampling for bagging.

use rand::Rng;

use crate::dataset::Row;
use crate::error::RfError;

/// Number of rows a bootstrap sample of `n_samples` rows draws at `ratio`.
///
/// `round(n_samples * ratio)`, rounding halves to even.
///
/// # Errors
///
/// Returns [`RfError::InvalidSampleRatio`] when `ratio` is not in
/// `(0.0, 2.0]` or the sample would contain no rows.
pub fn bootstrap_size(n_samples: usize, ratio: f64) -> Result<usize, RfError> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 2.0 {
        return Err(RfError::InvalidSampleRatio { ratio, n_samples });
    }
    let size = (n_samples as f64 * ratio).round_ties_even() as usize;
    if size == 0 {
        return Err(RfError::InvalidSampleRatio { ratio, n_samples });
    }
    Ok(size)
}

/// Draw a bootstrap sample: `bootstrap_size(rows.len(), ratio)` rows chosen
/// uniformly with replacement.
///
/// # Errors
///
/// Returns [`RfError::InvalidSampleRatio`] as [`bootstrap_size`] does.
pub fn subsample<'a>(rows: &'a [Row], ratio: f64, rng: &mut impl Rng) -> Result<Vec<&'a Row>, RfError> {
    let size = bootstrap_size(rows.len(), ratio)?;
    Ok((0..size).map(|_| &rows[rng.gen_range(0..rows.len())]).collect())
}
