//! Cross-sectional z-score.
//!
//! Formula: `(x - mean(x)) / std(x)` with the population standard deviation
//! (ddof = 0). A constant row divides by zero and yields NaN.

use crate::{
    Result, panel,
    reduce::{Ddof, Reduction},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};

/// Z-score operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZScore;

impl ZScore {
    /// Apply to a rank-1 or rank-2 array.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows(x, |rows| Ok(Self::kernel(rows)))
    }

    fn kernel(rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let mean = Reduction::Mean.rows(rows);
        let std = Reduction::Std(Ddof::Population).rows(rows);
        (&rows - &mean) / &std
    }
}

impl Operator for ZScore {
    fn name(&self) -> &str {
        "zscore"
    }

    fn description(&self) -> &str {
        "Distance from the cross-sectional mean in population standard deviations"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Standardize
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(Self::kernel(inputs[0]))
    }
}

/// Z-score each cross-section; see [`ZScore`].
pub fn zscore<S, D>(x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    ZScore.apply(x)
}
