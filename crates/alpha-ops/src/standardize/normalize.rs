//! Cross-sectional demeaning with optional scaling and clipping.
//!
//! Formula: `x - mean(x)`, optionally divided by the sample standard
//! deviation (ddof = 1), optionally clipped to `[-limit, +limit]`.

use crate::{
    Result, panel,
    reduce::{self, Ddof, Reduction},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Normalize operator.
///
/// Subtracts the row mean from every element. With `use_std` the result is
/// divided by the row sample standard deviation. A nonzero `limit` clips the
/// result element-wise to `[-|limit|, +|limit|]`, so the sign of `limit` is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Normalize {
    /// Divide by the row sample standard deviation
    #[serde(alias = "useStd")]
    pub use_std: bool,
    /// Clip bound magnitude; `0` disables clipping
    pub limit: f64,
}

impl Normalize {
    /// Create a Normalize operator that only demeans.
    pub const fn new() -> Self {
        Self {
            use_std: false,
            limit: 0.0,
        }
    }

    /// Toggle division by the row sample standard deviation.
    pub const fn with_std(self, use_std: bool) -> Self {
        Self { use_std, ..self }
    }

    /// Clip the result to `[-limit, +limit]`.
    pub const fn with_limit(self, limit: f64) -> Self {
        Self { limit, ..self }
    }

    /// Apply to a rank-1 or rank-2 array.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows(x, |rows| Ok(self.kernel(rows)))
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = &rows - &Reduction::Mean.rows(rows);
        if self.use_std {
            out /= &Reduction::Std(Ddof::Sample).rows(rows);
        }
        if self.limit != 0.0 {
            let limit = self.limit.abs();
            out.mapv_inplace(|v| reduce::clip(v, -limit, limit));
        }
        out
    }
}

impl Default for Normalize {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Normalize {
    fn name(&self) -> &str {
        "normalize"
    }

    fn description(&self) -> &str {
        "Subtract the cross-sectional mean, optionally scale by sample std and clip"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Standardize
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(self.kernel(inputs[0]))
    }
}

/// Demean each cross-section; see [`Normalize`].
pub fn normalize<S, D>(x: &ArrayBase<S, D>, use_std: bool, limit: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Normalize::new().with_std(use_std).with_limit(limit).apply(x)
}
