//! Generalized pairwise rank.
//!
//! For every pair of valid instruments in a row, the difference between
//! their values raised to the power `m` is added to the score of the larger
//! one and subtracted from the smaller one:
//!
//! `out_i = Σ_j sign(x_i - x_j) · |x_i - x_j|^m`
//!
//! With `m = 0` this counts dominated minus dominating instruments, an affine
//! map of the ordinary rank. Cost is quadratic in the row width.

use crate::{OperatorError, Result, panel, reduce, registry::OperatorCategory, traits::Operator};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Generalized rank operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralizedRank {
    /// Exponent applied to pairwise differences
    pub m: f64,
}

impl GeneralizedRank {
    /// Create a GeneralizedRank operator with `m = 1`.
    pub const fn new() -> Self {
        Self { m: 1.0 }
    }

    /// Create a GeneralizedRank operator with a custom exponent.
    pub const fn with_exponent(m: f64) -> Self {
        Self { m }
    }

    /// Apply to a rank-1 or rank-2 array.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.validate()?;
        panel::map_rows(x, |rows| Ok(self.kernel(rows)))
    }

    fn validate(&self) -> Result<()> {
        OperatorError::require(
            self.m.is_finite() && self.m >= 0.0,
            "m",
            "must be finite and non-negative",
        )
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let m = self.m;
        panel::par_rows(rows, |row, mut out| {
            let entries = reduce::valid_entries(row);
            for &(pos, xi) in &entries {
                out[pos] = entries
                    .iter()
                    .map(|&(_, xj)| {
                        let diff = xi - xj;
                        if diff == 0.0 {
                            0.0
                        } else {
                            diff.signum() * diff.abs().powf(m)
                        }
                    })
                    .sum();
            }
        })
    }
}

impl Default for GeneralizedRank {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for GeneralizedRank {
    fn name(&self) -> &str {
        "generalized_rank"
    }

    fn description(&self) -> &str {
        "Sum of signed pairwise differences raised to the power m"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Ranking
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        self.validate()?;
        Ok(self.kernel(inputs[0]))
    }
}

/// Generalized rank of each cross-section; see [`GeneralizedRank`].
pub fn generalized_rank<S, D>(x: &ArrayBase<S, D>, m: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    GeneralizedRank::with_exponent(m).apply(x)
}
