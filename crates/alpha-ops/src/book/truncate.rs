//! Concentration cap.
//!
//! Every value is capped at `max_percent` of its row's NaN-ignoring sum:
//! `out = minimum(x, max_percent * nansum(x))`. The reference is the plain
//! row sum, so on rows with a negative or zero sum the cap falls below the
//! positive entries.

use crate::{
    OperatorError, Result, panel,
    reduce::{self, Reduction},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Truncate operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Truncate {
    /// Cap as a fraction of the row sum
    #[serde(alias = "maxPercent")]
    pub max_percent: f64,
}

impl Truncate {
    /// Create a Truncate operator with a 1% cap.
    pub const fn new() -> Self {
        Self { max_percent: 0.01 }
    }

    /// Set the cap fraction.
    pub const fn with_max_percent(self, max_percent: f64) -> Self {
        Self { max_percent }
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
        OperatorError::require(self.max_percent.is_finite(), "max_percent", "must be finite")
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let cap = Reduction::Sum.rows(rows) * self.max_percent;
        Zip::from(&rows)
            .and_broadcast(&cap)
            .map_collect(|&v, &c| reduce::minimum(v, c))
    }
}

impl Default for Truncate {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Truncate {
    fn name(&self) -> &str {
        "truncate"
    }

    fn description(&self) -> &str {
        "Cap every value at a fraction of its cross-section's sum"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Book
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        self.validate()?;
        Ok(self.kernel(inputs[0]))
    }
}

/// Cap each cross-section's values; see [`Truncate`].
pub fn truncate<S, D>(x: &ArrayBase<S, D>, max_percent: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Truncate::new().with_max_percent(max_percent).apply(x)
}
