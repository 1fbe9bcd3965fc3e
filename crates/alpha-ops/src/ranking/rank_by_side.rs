//! Side-separated rank scaled to book.
//!
//! Positive values are ranked among the positives and negative values are
//! ranked by magnitude among the negatives. Each side is then rescaled so the
//! long side sums to `scale` and the short side to `-scale`. Zeros stay zero
//! and missing values stay missing.

use crate::{
    OperatorError, Result, panel,
    reduce::{self, SortPrecision},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Rank-by-side operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankBySide {
    /// Sort precision exponent; `0` is exact
    pub rate: u32,
    /// Book size of each side
    pub scale: f64,
}

impl RankBySide {
    /// Create a RankBySide operator with exact ranks and unit book.
    pub const fn new() -> Self {
        Self {
            rate: 0,
            scale: 1.0,
        }
    }

    /// Set the sort precision exponent.
    pub const fn with_rate(self, rate: u32) -> Self {
        Self { rate, ..self }
    }

    /// Set the per-side book size.
    pub const fn with_scale(self, scale: f64) -> Self {
        Self { scale, ..self }
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
        OperatorError::require(self.scale.is_finite(), "scale", "must be finite")
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let precision = SortPrecision::from_rate(self.rate);
        let scale = self.scale;
        panel::par_rows(rows, |row, out| rank_sides(row, out, precision, scale))
    }
}

fn rank_sides(
    row: ArrayView1<'_, f64>,
    mut out: ArrayViewMut1<'_, f64>,
    precision: SortPrecision,
    scale: f64,
) {
    let entries = reduce::valid_entries(row);
    let longs: Vec<(usize, f64)> = entries.iter().copied().filter(|&(_, v)| v > 0.0).collect();
    let shorts: Vec<(usize, f64)> = entries
        .iter()
        .filter(|&&(_, v)| v < 0.0)
        .map(|&(pos, v)| (pos, -v))
        .collect();

    for &(pos, v) in &entries {
        if v == 0.0 {
            out[pos] = 0.0;
        }
    }
    for (side, sign) in [(longs, 1.0), (shorts, -1.0)] {
        let ranks = reduce::percentile_ranks(&side, precision);
        let book: f64 = ranks.iter().map(|&(_, r)| r).sum();
        for (pos, r) in ranks {
            out[pos] = sign * r / book * scale;
        }
    }
}

impl Default for RankBySide {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for RankBySide {
    fn name(&self) -> &str {
        "rank_by_side"
    }

    fn description(&self) -> &str {
        "Rank positive and negative values separately and scale each side to book"
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

/// Rank each side of each cross-section separately; see [`RankBySide`].
pub fn rank_by_side<S, D>(x: &ArrayBase<S, D>, rate: u32, scale: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    RankBySide::new().with_rate(rate).with_scale(scale).apply(x)
}
