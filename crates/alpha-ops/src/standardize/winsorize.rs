//! Cross-sectional winsorization at a multiple of the standard deviation.
//!
//! Each row is clipped to `[mean - std * σ, mean + std * σ]` where σ is the
//! population standard deviation (ddof = 0) of the row's valid entries.
//!
//! A second pass is a no-op whenever the first pass clipped nothing. That is
//! always the case for rows with at most `std² + 1` valid values, since no
//! population z-score can exceed `sqrt(k - 1)`.

use crate::{
    OperatorError, Result, panel,
    reduce::{self, Ddof, Reduction},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Winsorize operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Winsorize {
    /// Half-width of the clip band in standard deviations
    pub std: f64,
}

impl Winsorize {
    /// Create a Winsorize operator with the default band of 4 standard deviations.
    pub const fn new() -> Self {
        Self { std: 4.0 }
    }

    /// Create a Winsorize operator with a custom band.
    pub const fn with_std(std: f64) -> Self {
        Self { std }
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
            self.std.is_finite() && self.std >= 0.0,
            "std",
            "must be finite and non-negative",
        )
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let mean = Reduction::Mean.rows(rows);
        let band = Reduction::Std(Ddof::Population).rows(rows) * self.std;
        let lower = &mean - &band;
        let upper = &mean + &band;

        let mut out = rows.to_owned();
        Zip::from(out.rows_mut())
            .and(lower.rows())
            .and(upper.rows())
            .for_each(|mut row, lo, hi| {
                let (lo, hi) = (lo[0], hi[0]);
                row.mapv_inplace(|v| reduce::clip(v, lo, hi));
            });
        out
    }
}

impl Default for Winsorize {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Winsorize {
    fn name(&self) -> &str {
        "winsorize"
    }

    fn description(&self) -> &str {
        "Clip each cross-section to mean ± std × population standard deviation"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Standardize
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        self.validate()?;
        Ok(self.kernel(inputs[0]))
    }
}

/// Winsorize each cross-section; see [`Winsorize`].
pub fn winsorize<S, D>(x: &ArrayBase<S, D>, std: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Winsorize::with_std(std).apply(x)
}
